use crate::pieces::{Piece, PieceMask};
use crate::types::{CellValue, GameOverReason, GameStats, Phase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceSnapshot {
    pub id: u8,
    pub name: &'static str,
    pub color: CellValue,
    pub mask: PieceMask,
}

impl From<Piece> for PieceSnapshot {
    fn from(value: Piece) -> Self {
        Self {
            id: value.id(),
            name: value.name(),
            color: value.color(),
            mask: *value.mask(),
        }
    }
}

/// Point-in-time copy of everything a renderer or observer may read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub width: u8,
    pub height: u8,
    /// Row-major cell values (`y * width + x`)
    pub cells: Vec<CellValue>,
    pub phase: Phase,
    pub stats: GameStats,
    pub high_score: u32,
    /// `None` while idle
    pub current: Option<PieceSnapshot>,
    pub next: Option<PieceSnapshot>,
    /// Completed turns (placements plus timeouts)
    pub turn: u64,
    pub seed: u32,
    /// Turn timer for the current level
    pub delay_ms: u32,
    pub game_over_reason: Option<GameOverReason>,
}

impl GameSnapshot {
    pub fn cell(&self, x: u8, y: u8) -> Option<CellValue> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.cells.chunks(self.width.max(1) as usize)
    }

    pub fn playable(&self) -> bool {
        self.phase == Phase::Running
    }
}
