//! High-score persistence collaborator
//!
//! The core only ever exchanges a single integer score with storage. File or network formats
//! belong to the implementor of [`HighScoreStore`].

use std::sync::Mutex;

/// The store could not be read or written. Never fatal to a game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("high score store unavailable: {reason}")]
pub struct PersistenceUnavailable {
    pub reason: String,
}

impl PersistenceUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

pub trait HighScoreStore: Send + Sync {
    /// Best score recorded so far.
    fn load_high_score(&self) -> Result<u32, PersistenceUnavailable>;

    /// Record the final score of a finished game.
    fn submit_score(&self, score: u32) -> Result<(), PersistenceUnavailable>;
}

/// In-process store keeping every submitted score.
#[derive(Debug, Default)]
pub struct MemoryHighScores {
    scores: Mutex<Vec<u32>>,
}

impl MemoryHighScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a best score
    pub fn with_high_score(score: u32) -> Self {
        Self {
            scores: Mutex::new(vec![score]),
        }
    }

    /// Scores in submission order (including any seed score).
    pub fn scores(&self) -> Vec<u32> {
        self.scores
            .lock()
            .map(|scores| scores.clone())
            .unwrap_or_default()
    }
}

impl HighScoreStore for MemoryHighScores {
    fn load_high_score(&self) -> Result<u32, PersistenceUnavailable> {
        let scores = self
            .scores
            .lock()
            .map_err(|_| PersistenceUnavailable::new("score list poisoned"))?;
        Ok(scores.iter().copied().max().unwrap_or(0))
    }

    fn submit_score(&self, score: u32) -> Result<(), PersistenceUnavailable> {
        self.scores
            .lock()
            .map_err(|_| PersistenceUnavailable::new("score list poisoned"))?
            .push(score);
        Ok(())
    }
}
