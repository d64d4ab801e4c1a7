//! Headless greedy player.
//!
//! Drives one in-process game: each turn it places the piece, in whichever orientation and after
//! an optional swap, that clears the most blocks. When nothing fits it lets the turn timer run out.

use std::sync::Arc;

use anyhow::Result;

use tetrecs::cli::{parse_autoplay_args, plan_turn};
use tetrecs::core::{GameEvent, MemoryHighScores};
use tetrecs::engine::{spawn_game, EngineConfig, EngineError};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let parsed = parse_autoplay_args(&args)?;

    let mut config = EngineConfig::from_env();
    if let Some(seed) = parsed.seed {
        config.seed = seed;
    }
    println!("[Autoplay] seed {}", config.seed);

    let game = spawn_game(config, Arc::new(MemoryHighScores::new()))?;
    game.start().await?;

    loop {
        let mut events = game.subscribe();
        let snapshot = game.snapshot().await?;
        if !snapshot.playable() {
            break;
        }
        if snapshot.turn >= parsed.max_turns {
            println!("[Autoplay] turn limit {} reached", parsed.max_turns);
            game.abandon().await?;
            break;
        }

        let Some(plan) = plan_turn(&snapshot) else {
            println!("[Autoplay] no legal placement, waiting for the turn timer");
            loop {
                match events.recv().await {
                    Ok(GameEvent::LifeLost { .. }) | Ok(GameEvent::GameOver { .. }) => break,
                    Ok(_) | Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        return Err(EngineError::Closed.into())
                    }
                }
            }
            continue;
        };

        let placed = async {
            if plan.swap {
                game.request_swap_pieces().await?;
            }
            for direction in plan.rotation_steps() {
                game.request_rotate(direction).await?;
            }
            game.attempt_placement(plan.x, plan.y).await
        }
        .await;

        match placed {
            Ok(outcome) if outcome.lines_cleared > 0 => {
                println!(
                    "[Autoplay] turn {}: cleared {} lines for {} points",
                    snapshot.turn + 1,
                    outcome.lines_cleared,
                    outcome.points
                );
            }
            Ok(_) => {}
            // The turn timed out while planning; plan again against the new state.
            // The game may also have ended, which the next snapshot reports.
            Err(EngineError::Game(e)) => println!("[Autoplay] placement rejected: {}", e),
            Err(e) => return Err(e.into()),
        }
    }

    let score = game.wait_for_game_over().await?;
    println!("[Autoplay] final score {}", score);
    Ok(())
}
