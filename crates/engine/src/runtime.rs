//! Game task runtime.
//!
//! One tokio task owns the [`Game`] and its turn deadline. Requests from any number of
//! [`GameHandle`]s and expiries of the deadline are handled one at a time by that task, so a
//! placement and a timeout can never interleave. The deadline is a plain value replaced on every
//! reset; a cancelled timer has nothing left that could fire.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};

use tetrecs_core::{
    Game, GameError, GameEvent, GameSnapshot, HighScoreStore, Piece, PlacementOutcome,
    TimeoutOutcome,
};
use tetrecs_types::{GameStats, Phase, RotateDirection};

use crate::config::{EngineConfig, MAX_PENDING_LIMIT};

/// Capacity of the event broadcast; slower subscribers observe `Lagged`.
const EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error("game task has stopped")]
    Closed,
}

enum Request {
    Start(oneshot::Sender<Result<u32, GameError>>),
    Place {
        x: i8,
        y: i8,
        reply: oneshot::Sender<Result<PlacementOutcome, GameError>>,
    },
    Rotate {
        direction: RotateDirection,
        reply: oneshot::Sender<Result<Piece, GameError>>,
    },
    Swap(oneshot::Sender<Result<(Piece, Piece), GameError>>),
    Abandon(oneshot::Sender<Result<u32, GameError>>),
    Snapshot(oneshot::Sender<GameSnapshot>),
}

/// Cloneable handle to a running game task
///
/// The task stops when the last handle is dropped, taking any pending timer with it.
#[derive(Debug, Clone)]
pub struct GameHandle {
    tx: mpsc::Sender<Request>,
    events: broadcast::Sender<GameEvent>,
    stats: watch::Receiver<GameStats>,
    final_score: watch::Receiver<Option<u32>>,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Request::Start(_) => "Start",
            Request::Place { .. } => "Place",
            Request::Rotate { .. } => "Rotate",
            Request::Swap(_) => "Swap",
            Request::Abandon(_) => "Abandon",
            Request::Snapshot(_) => "Snapshot",
        };
        f.write_str(name)
    }
}

/// Spawn a game task on the current tokio runtime.
///
/// The high score is read from `store` once; an unavailable store counts as 0. The final score
/// is submitted to `store` when the game ends.
pub fn spawn_game(
    config: EngineConfig,
    store: Arc<dyn HighScoreStore>,
) -> Result<GameHandle, EngineError> {
    let high_score = match store.load_high_score() {
        Ok(score) => score,
        Err(e) => {
            eprintln!("[Engine] {}; starting from 0", e);
            0
        }
    };
    let game = Game::new(config.game_config(high_score))?;

    let (tx, rx) = mpsc::channel(config.max_pending.clamp(1, MAX_PENDING_LIMIT));
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    let (stats_tx, stats_rx) = watch::channel(game.stats());
    let (over_tx, over_rx) = watch::channel(None);

    let task = GameTask {
        game,
        deadline: None,
        events: events.clone(),
        stats: stats_tx,
        final_score: over_tx,
        store,
    };
    tokio::spawn(task.run(rx));

    Ok(GameHandle {
        tx,
        events,
        stats: stats_rx,
        final_score: over_rx,
    })
}

impl GameHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> Result<T, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| EngineError::Closed)?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// `Idle -> Running`; returns the first turn delay in milliseconds.
    pub async fn start(&self) -> Result<u32, EngineError> {
        Ok(self.request(Request::Start).await??)
    }

    pub async fn attempt_placement(&self, x: i8, y: i8) -> Result<PlacementOutcome, EngineError> {
        Ok(self
            .request(|reply| Request::Place { x, y, reply })
            .await??)
    }

    pub async fn request_rotate(&self, direction: RotateDirection) -> Result<Piece, EngineError> {
        Ok(self
            .request(|reply| Request::Rotate { direction, reply })
            .await??)
    }

    pub async fn request_swap_pieces(&self) -> Result<(Piece, Piece), EngineError> {
        Ok(self.request(Request::Swap).await??)
    }

    /// End a running game; returns the final score.
    pub async fn abandon(&self) -> Result<u32, EngineError> {
        Ok(self.request(Request::Abandon).await??)
    }

    pub async fn snapshot(&self) -> Result<GameSnapshot, EngineError> {
        self.request(Request::Snapshot).await
    }

    /// Receive every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Score, level, lives and multiplier as a change stream.
    pub fn stats(&self) -> watch::Receiver<GameStats> {
        self.stats.clone()
    }

    /// Resolve with the final score once the game is over.
    pub async fn wait_for_game_over(&self) -> Result<u32, EngineError> {
        let mut rx = self.final_score.clone();
        let score = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| EngineError::Closed)?;
        Ok((*score).unwrap_or_default())
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

struct GameTask {
    game: Game,
    /// When the running turn times out; `None` while no timer is armed
    deadline: Option<Instant>,
    events: broadcast::Sender<GameEvent>,
    stats: watch::Sender<GameStats>,
    final_score: watch::Sender<Option<u32>>,
    store: Arc<dyn HighScoreStore>,
}

impl GameTask {
    async fn run(mut self, mut rx: mpsc::Receiver<Request>) {
        loop {
            let deadline = self.deadline;
            let expiry = async move {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => future::pending::<()>().await,
                }
            };

            tokio::select! {
                biased;
                request = rx.recv() => match request {
                    Some(request) => self.handle(request),
                    None => break,
                },
                _ = expiry => self.expire(),
            }
        }
    }

    fn handle(&mut self, request: Request) {
        match request {
            Request::Start(reply) => {
                let result = self.game.start();
                if let Ok(delay_ms) = result {
                    self.arm(Duration::from_millis(delay_ms as u64));
                }
                self.flush();
                let _ = reply.send(result);
            }
            Request::Place { x, y, reply } => {
                let result = self.game.attempt_placement(x, y);
                if let Ok(outcome) = &result {
                    self.arm(Duration::from_millis(outcome.delay_ms as u64));
                }
                self.flush();
                let _ = reply.send(result);
            }
            Request::Rotate { direction, reply } => {
                let result = self.game.rotate_current(direction);
                self.flush();
                let _ = reply.send(result);
            }
            Request::Swap(reply) => {
                let result = self.game.swap_pieces();
                self.flush();
                let _ = reply.send(result);
            }
            Request::Abandon(reply) => {
                let result = self.game.abandon();
                self.flush();
                let _ = reply.send(result);
            }
            Request::Snapshot(reply) => {
                let _ = reply.send(self.game.snapshot());
            }
        }
    }

    fn expire(&mut self) {
        self.deadline = None;
        if let Ok(TimeoutOutcome::Continue { lives, delay_ms }) = self.game.on_timer_expiry() {
            println!("[Engine] turn timed out, {} lives remaining", lives);
            self.arm(Duration::from_millis(delay_ms as u64));
        }
        self.flush();
    }

    /// Replace the turn deadline. A deadline that cannot be represented ends the game.
    fn arm(&mut self, delay: Duration) {
        self.deadline = Instant::now().checked_add(delay);
        if self.deadline.is_none() {
            eprintln!("[Engine] cannot schedule turn timer ({:?})", delay);
            let _ = self.game.scheduler_exhausted();
        }
    }

    /// Publish pending events and stats, and settle a finished game.
    fn flush(&mut self) {
        for event in self.game.take_events() {
            let _ = self.events.send(event);
        }

        let stats = self.game.stats();
        self.stats.send_if_modified(|current| {
            if *current == stats {
                return false;
            }
            *current = stats;
            true
        });

        if self.game.phase() == Phase::GameOver && self.final_score.borrow().is_none() {
            self.deadline = None;
            let score = self.game.score();
            let reason = self
                .game
                .game_over_reason()
                .map(|r| r.as_str())
                .unwrap_or("unknown");
            println!("[Engine] game over ({}), final score {}", reason, score);
            if let Err(e) = self.store.submit_score(score) {
                eprintln!("[Engine] {}; final score {} not recorded", e, score);
            }
            self.final_score.send_replace(Some(score));
        }
    }
}
