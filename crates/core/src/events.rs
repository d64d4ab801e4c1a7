//! Notifications emitted by a game, drained by the runtime after each operation.

use crate::error::GameError;
use crate::pieces::Piece;
use crate::types::{CellChange, Coord, EventKind, GameOverReason, GameStats};

/// A single state change, in the order it happened within a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The game left `Idle`; the first turn timer runs for `delay_ms`.
    Started { delay_ms: u32 },
    /// One grid cell was written (placement or clear).
    CellChanged(CellChange),
    /// The current piece was committed with its footprint centered on (x, y).
    Placed { x: i8, y: i8, piece: u8 },
    /// A placement attempt was refused; nothing changed.
    Rejected { x: i8, y: i8, piece: u8, error: GameError },
    /// Full lines were cleared. `cells` is the union of their coordinates.
    LinesCleared {
        cells: Vec<Coord>,
        lines: u32,
        blocks: u32,
    },
    /// A timeout cost a life.
    LifeLost { lives: u32 },
    /// Current or next piece changed (advance, rotate or swap).
    PiecesChanged { current: Piece, next: Piece },
    StatsChanged(GameStats),
    /// A new turn timer was armed after turn number `turn` completed.
    TimerReset { delay_ms: u32, turn: u64 },
    /// Terminal: no further events follow.
    GameOver {
        final_score: u32,
        reason: GameOverReason,
    },
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::Started { .. } => EventKind::Started,
            GameEvent::CellChanged(_) => EventKind::CellChanged,
            GameEvent::Placed { .. } => EventKind::Placed,
            GameEvent::Rejected { .. } => EventKind::Rejected,
            GameEvent::LinesCleared { .. } => EventKind::LineCleared,
            GameEvent::LifeLost { .. } => EventKind::LifeLost,
            GameEvent::PiecesChanged { .. } => EventKind::PiecesChanged,
            GameEvent::StatsChanged(_) => EventKind::StatsChanged,
            GameEvent::TimerReset { .. } => EventKind::TimerReset,
            GameEvent::GameOver { .. } => EventKind::GameOver,
        }
    }

    /// True for the kinds a sound or effect layer reacts to.
    pub fn is_semantic(&self) -> bool {
        matches!(
            self.kind(),
            EventKind::Placed
                | EventKind::Rejected
                | EventKind::LineCleared
                | EventKind::LifeLost
                | EventKind::GameOver
        )
    }
}
