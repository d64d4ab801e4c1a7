//! Core game logic module - pure, deterministic, and testable
//!
//! This crate contains all the rules of the TetrECS grid game: the 15-piece catalog, the grid
//! model, simultaneous row-and-column clearing, multiplier scoring and the turn state machine.
//! It has **no dependencies** on timers, networking, or I/O, making it:
//!
//! - **Deterministic**: Same seed produces identical piece sequences
//! - **Testable**: Every rule is a plain function or a method on an owned value
//! - **Portable**: Can be driven by any runtime (the tokio engine, a test, a benchmark)
//!
//! # Module Structure
//!
//! - [`grid`]: W x H cell matrix with bounds-checked access and placement legality
//! - [`pieces`]: 3x3 piece catalog and value-based rotation
//! - [`line_clear`]: full row/column detection and clearing
//! - [`scoring`]: score, multiplier, level and turn timer formulas
//! - [`rng`]: seedable LCG and the current/next piece sequencer
//! - [`game`]: `Idle -> Running -> GameOver` turn state machine
//! - [`events`]: change notifications recorded by a game
//! - [`persistence`]: high-score collaborator interface
//! - [`snapshot`]: point-in-time copies for renderers and observers
//!
//! # Game Rules
//!
//! - **Placement**: the current piece's 3x3 footprint is centered on the chosen cell and must
//!   land entirely on empty cells
//! - **Clearing**: every full row and every full column clears at once
//! - **Scoring**: `lines * blocks * 10 * multiplier`; the multiplier grows on each clearing turn
//!   and resets to 1 otherwise
//! - **Timer**: each turn must be played within `max(2500, 12000 - 500 * level)` ms or a life is
//!   lost; the game ends when no lives remain
//!
//! # Example
//!
//! ```
//! use tetrecs_core::{Game, GameConfig, TimeoutOutcome};
//!
//! let mut game = Game::new(GameConfig::with_seed(12345)).unwrap();
//! let delay = game.start().unwrap();
//! assert_eq!(delay, 12_000);
//!
//! // Play the current piece in the middle of the empty grid
//! game.attempt_placement(2, 2).unwrap();
//! assert_eq!(game.turn(), 1);
//!
//! // Let the timer run out
//! let outcome = game.on_timer_expiry().unwrap();
//! assert!(matches!(outcome, TimeoutOutcome::Continue { lives: 2, .. }));
//! ```

pub mod error;
pub mod events;
pub mod game;
pub mod grid;
pub mod line_clear;
pub mod persistence;
pub mod pieces;
pub mod rng;
pub mod scoring;
pub mod snapshot;

pub use tetrecs_types as types;

// Re-export commonly used types for convenience
pub use error::GameError;
pub use events::GameEvent;
pub use game::{Game, GameConfig, PlacementOutcome, TimeoutOutcome};
pub use grid::Grid;
pub use line_clear::{detect_full_lines, LineClear};
pub use persistence::{HighScoreStore, MemoryHighScores, PersistenceUnavailable};
pub use pieces::{catalog, create_piece, rotate, Piece};
pub use rng::{PieceSequencer, SimpleRng};
pub use scoring::{compute_delay_ms, ScoreUpdate};
pub use snapshot::{GameSnapshot, PieceSnapshot};
