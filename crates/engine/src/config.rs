//! Engine configuration

use tetrecs_core::GameConfig;
use tetrecs_types::{GRID_HEIGHT, GRID_WIDTH, STARTING_LIVES};

/// Upper bound on the request queue depth; larger values are clamped.
pub const MAX_PENDING_LIMIT: usize = 4096;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub width: u8,
    pub height: u8,
    pub seed: u32,
    pub starting_lives: u32,
    /// Depth of the request queue in front of the game task, within `1..=MAX_PENDING_LIMIT`
    pub max_pending: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            seed: 1,
            starting_lives: STARTING_LIVES,
            max_pending: 16,
        }
    }
}

impl EngineConfig {
    /// Create from environment variables
    ///
    /// Unset or unparsable values fall back to the defaults. Without `TETRECS_SEED` the seed is
    /// derived from the system clock. `TETRECS_MAX_PENDING` is clamped to `1..=MAX_PENDING_LIMIT`.
    pub fn from_env() -> Self {
        use std::env;

        fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
            env::var(key).ok().and_then(|s| s.trim().parse().ok())
        }

        let defaults = Self::default();
        Self {
            width: parsed("TETRECS_GRID_WIDTH").unwrap_or(defaults.width),
            height: parsed("TETRECS_GRID_HEIGHT").unwrap_or(defaults.height),
            seed: parsed("TETRECS_SEED").unwrap_or_else(clock_seed),
            starting_lives: parsed("TETRECS_LIVES").unwrap_or(defaults.starting_lives),
            max_pending: parsed("TETRECS_MAX_PENDING")
                .unwrap_or(defaults.max_pending)
                .clamp(1, MAX_PENDING_LIMIT),
        }
    }

    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Game parameters for a new game, given the persisted high score
    pub fn game_config(&self, high_score: u32) -> GameConfig {
        GameConfig {
            width: self.width,
            height: self.height,
            seed: self.seed,
            starting_lives: self.starting_lives,
            high_score,
        }
    }
}

fn clock_seed() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(1)
}
