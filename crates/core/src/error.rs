//! Typed rejections returned by the grid, the catalog and the turn state machine.
//!
//! Every variant is non-fatal: the operation that produced it left all state unchanged.

use crate::types::{CellValue, Phase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("coordinate ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds { x: i8, y: i8, width: u8, height: u8 },

    #[error("piece {piece} cannot be placed at ({x}, {y})")]
    IllegalPlacement { piece: u8, x: i8, y: i8 },

    #[error("cannot {operation} while the game is {phase}")]
    InvalidStateTransition {
        operation: &'static str,
        phase: Phase,
    },

    #[error("cell value {0} is outside 0..=15")]
    InvalidCellValue(CellValue),

    #[error("piece id {0} is not in the catalog")]
    UnknownPiece(u8),

    #[error("grid dimensions {width}x{height} are not supported")]
    InvalidDimensions { width: u8, height: u8 },
}

impl GameError {
    /// Stable machine-readable code, used by the adapter protocol.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::OutOfBounds { .. } => "out_of_bounds",
            GameError::IllegalPlacement { .. } => "illegal_placement",
            GameError::InvalidStateTransition { .. } => "invalid_state",
            GameError::InvalidCellValue(_) => "invalid_cell_value",
            GameError::UnknownPiece(_) => "unknown_piece",
            GameError::InvalidDimensions { .. } => "invalid_dimensions",
        }
    }
}
