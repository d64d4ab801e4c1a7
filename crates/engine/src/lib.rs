//! Engine crate - the game loop controller runtime
//!
//! Runs one [`Game`](tetrecs_core::Game) per tokio task and turns placement requests and turn
//! timer expiries into a single ordered stream of atomic turns.
//!
//! - [`spawn_game`] starts the task and returns a [`GameHandle`]
//! - the handle sends requests (`start`, `attempt_placement`, `request_rotate`,
//!   `request_swap_pieces`, `abandon`, `snapshot`) and awaits their results
//! - [`GameHandle::subscribe`] streams every [`GameEvent`](tetrecs_core::GameEvent)
//! - [`GameHandle::stats`] streams score, level, lives and multiplier changes
//!
//! # Environment Variables
//!
//! - `TETRECS_GRID_WIDTH` / `TETRECS_GRID_HEIGHT`: grid size (default 5x5)
//! - `TETRECS_SEED`: piece sequence seed (default: derived from the clock)
//! - `TETRECS_LIVES`: starting lives (default 3)
//! - `TETRECS_MAX_PENDING`: request queue depth (default 16, clamped to 1..=4096)
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tetrecs_core::MemoryHighScores;
//! use tetrecs_engine::{spawn_game, EngineConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let handle = spawn_game(EngineConfig::with_seed(7), Arc::new(MemoryHighScores::new())).unwrap();
//! handle.start().await.unwrap();
//! handle.attempt_placement(2, 2).await.unwrap();
//! assert_eq!(handle.snapshot().await.unwrap().turn, 1);
//! # }
//! ```

pub mod config;
pub mod runtime;

pub use tetrecs_core as core;
pub use tetrecs_types as types;

pub use config::EngineConfig;
pub use runtime::{spawn_game, EngineError, GameHandle};
