use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use tetrecs::core::{GameEvent, MemoryHighScores};
use tetrecs::engine::{spawn_game, EngineConfig, EngineError};
use tetrecs::types::{EventKind, GameOverReason, Phase};

fn store() -> Arc<MemoryHighScores> {
    Arc::new(MemoryHighScores::new())
}

#[tokio::test(start_paused = true)]
async fn unattended_game_ends_after_three_turn_timers() {
    let scores = store();
    let game = spawn_game(EngineConfig::with_seed(5), scores.clone()).unwrap();
    let began = Instant::now();
    assert_eq!(game.start().await.unwrap(), 12_000);

    let score = game.wait_for_game_over().await.unwrap();
    assert_eq!(score, 0);

    let elapsed = began.elapsed();
    assert!(elapsed >= Duration::from_millis(36_000), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(37_000), "{:?}", elapsed);

    let snapshot = game.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, Phase::GameOver);
    assert_eq!(snapshot.stats.lives, 0);
    assert_eq!(snapshot.game_over_reason, Some(GameOverReason::LivesExhausted));
    assert_eq!(scores.scores(), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn placement_replaces_the_pending_timer() {
    let game = spawn_game(EngineConfig::with_seed(5), store()).unwrap();
    game.start().await.unwrap();

    sleep(Duration::from_millis(11_000)).await;
    game.attempt_placement(2, 2).await.unwrap();

    // Past the first deadline, short of the one armed by the placement.
    sleep(Duration::from_millis(11_000)).await;
    assert_eq!(game.snapshot().await.unwrap().stats.lives, 3);

    sleep(Duration::from_millis(1_500)).await;
    let snapshot = game.snapshot().await.unwrap();
    assert_eq!(snapshot.stats.lives, 2);
    assert_eq!(snapshot.turn, 2);
    assert_eq!(game.stats().borrow().lives, 2);
}

#[tokio::test(start_paused = true)]
async fn rejected_placement_keeps_the_timer_running() {
    let game = spawn_game(EngineConfig::with_seed(5), store()).unwrap();
    game.start().await.unwrap();

    sleep(Duration::from_millis(6_000)).await;
    let err = game.attempt_placement(9, 9).await.unwrap_err();
    assert!(matches!(err, EngineError::Game(_)));

    sleep(Duration::from_millis(6_500)).await;
    assert_eq!(game.snapshot().await.unwrap().stats.lives, 2);
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_life_loss_then_game_over() {
    let game = spawn_game(EngineConfig::with_seed(9), store()).unwrap();
    let mut events = game.subscribe();
    game.start().await.unwrap();

    let mut lives_seen = Vec::new();
    loop {
        match events.recv().await.unwrap() {
            GameEvent::LifeLost { lives } => lives_seen.push(lives),
            GameEvent::GameOver { reason, .. } => {
                assert_eq!(reason, GameOverReason::LivesExhausted);
                break;
            }
            _ => {}
        }
    }
    assert_eq!(lives_seen, vec![2, 1, 0]);
}

#[tokio::test(start_paused = true)]
async fn abandon_submits_score_and_stops_timer() {
    let scores = Arc::new(MemoryHighScores::with_high_score(700));
    let game = spawn_game(EngineConfig::with_seed(2), scores.clone()).unwrap();
    let mut events = game.subscribe();
    game.start().await.unwrap();
    assert_eq!(game.snapshot().await.unwrap().high_score, 700);

    assert_eq!(game.abandon().await.unwrap(), 0);
    assert_eq!(game.wait_for_game_over().await.unwrap(), 0);

    // Long after any turn timer would have fired, nothing else happens.
    sleep(Duration::from_secs(60)).await;
    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        kinds.push(event.kind());
    }
    assert_eq!(kinds.last(), Some(&EventKind::GameOver));
    assert!(!kinds.contains(&EventKind::LifeLost));
    assert_eq!(scores.scores(), vec![700, 0]);

    assert!(matches!(
        game.attempt_placement(2, 2).await,
        Err(EngineError::Game(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_are_serialized() {
    let game = spawn_game(EngineConfig::with_seed(17), store()).unwrap();
    game.start().await.unwrap();

    let a = game.clone();
    let b = game.clone();
    let (ra, rb) = tokio::join!(a.attempt_placement(1, 1), b.attempt_placement(3, 3));
    let completed = [ra.is_ok(), rb.is_ok()].iter().filter(|ok| **ok).count() as u64;

    assert_eq!(game.snapshot().await.unwrap().turn, completed);
}
