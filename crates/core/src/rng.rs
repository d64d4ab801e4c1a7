//! RNG module - seedable piece draws and the current/next piece sequencer
//!
//! Pieces are drawn independently and uniformly from the 15-shape catalog (no bag). The
//! sequencer keeps the piece in play and a one-piece preview.
//!
//! Uses a simple LCG so the same seed always yields the same game.

use crate::pieces::{catalog_piece, Piece};
use crate::types::{RotateDirection, PIECE_COUNT};

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    ///
    /// Maps through the high bits; the low bits of an LCG cycle with short periods.
    pub fn next_range(&mut self, max: u32) -> u32 {
        ((self.next_u32() as u64 * max as u64) >> 32) as u32
    }
}

/// Current piece, next piece, and the RNG that refills the preview
#[derive(Debug, Clone)]
pub struct PieceSequencer {
    current: Piece,
    next: Piece,
    rng: SimpleRng,
    seed: u32,
}

impl PieceSequencer {
    /// Create a sequencer and draw its first two pieces
    pub fn new(seed: u32) -> Self {
        let mut rng = SimpleRng::new(seed);
        let current = Self::draw(&mut rng);
        let next = Self::draw(&mut rng);
        Self {
            current,
            next,
            rng,
            seed,
        }
    }

    fn draw(rng: &mut SimpleRng) -> Piece {
        catalog_piece(rng.next_range(PIECE_COUNT as u32) as u8)
    }

    pub fn current(&self) -> Piece {
        self.current
    }

    pub fn next(&self) -> Piece {
        self.next
    }

    /// Promote the preview and draw a new one, returning the new (current, next) pair
    pub fn advance(&mut self) -> (Piece, Piece) {
        self.current = self.next;
        self.next = Self::draw(&mut self.rng);
        (self.current, self.next)
    }

    /// Exchange current and next
    pub fn swap(&mut self) -> (Piece, Piece) {
        std::mem::swap(&mut self.current, &mut self.next);
        (self.current, self.next)
    }

    /// Replace the current piece with its rotation
    pub fn rotate_current(&mut self, direction: RotateDirection) -> Piece {
        self.current = self.current.rotated(direction);
        self.current
    }

    /// Seed this sequencer was created with
    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl Default for PieceSequencer {
    fn default() -> Self {
        Self::new(1)
    }
}
