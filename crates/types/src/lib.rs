//! Shared types module - plain data and constants
//!
//! Everything here is dependency-free plain data, usable by the core rules, the engine runtime
//! and the network adapter alike.
//!
//! # Grid Dimensions
//!
//! The challenge grid is 5x5 by default:
//!
//! - **Width**: 5 columns (indexed 0-4)
//! - **Height**: 5 rows (indexed 0-4)
//! - **Cells**: `0` is empty, `1..=15` is the color id of the piece that filled it
//!
//! # Timer Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `BASE_TIMER_DELAY_MS` | 12000 | Turn timer at level 0 |
//! | `TIMER_DELAY_STEP_MS` | 500 | Reduction per level |
//! | `MIN_TIMER_DELAY_MS` | 2500 | Floor, reached at level 19 |
//!
//! # Examples
//!
//! ```
//! use tetrecs_types::{EventKind, Phase, RotateDirection, GRID_HEIGHT, GRID_WIDTH};
//!
//! let dir = RotateDirection::from_str("cw").unwrap();
//! assert_eq!(dir, RotateDirection::Clockwise);
//! assert_eq!(dir.opposite(), RotateDirection::CounterClockwise);
//!
//! assert_eq!(Phase::Running.as_str(), "running");
//! assert_eq!(EventKind::LineCleared.as_str(), "lineCleared");
//!
//! assert_eq!(GRID_WIDTH, 5);
//! assert_eq!(GRID_HEIGHT, 5);
//! ```

use std::fmt;

/// Default grid width in cells (5 columns)
pub const GRID_WIDTH: u8 = 5;

/// Default grid height in cells (5 rows)
pub const GRID_HEIGHT: u8 = 5;

/// Largest supported grid side; coordinates travel as `i8`.
pub const MAX_GRID_SIDE: u8 = i8::MAX as u8;

/// Number of shapes in the piece catalog
pub const PIECE_COUNT: u8 = 15;

/// Side length of a piece mask
pub const PIECE_SIZE: usize = 3;

/// Value of an empty cell
pub const EMPTY_CELL: CellValue = 0;

/// Largest valid cell value (color id of the last catalog piece)
pub const MAX_CELL_VALUE: CellValue = 15;

/// Lives at the start of a game
pub const STARTING_LIVES: u32 = 3;

/// Multiplier at the start of a game and after every non-clearing turn
pub const BASE_MULTIPLIER: u32 = 1;

/// Points per cleared block per cleared line, before the multiplier
pub const POINTS_PER_BLOCK: u32 = 10;

/// Score needed per level
pub const SCORE_PER_LEVEL: u32 = 1000;

/// Turn timer at level 0 (12 seconds)
pub const BASE_TIMER_DELAY_MS: u32 = 12_000;

/// Turn timer reduction per level
pub const TIMER_DELAY_STEP_MS: u32 = 500;

/// Turn timer floor (2.5 seconds)
pub const MIN_TIMER_DELAY_MS: u32 = 2_500;

/// A cell on the grid
///
/// - `0`: empty
/// - `1..=15`: filled with the color of piece `value - 1`
pub type CellValue = u8;

/// A coordinate inside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub x: u8,
    pub y: u8,
}

impl Coord {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A single cell write, as delivered to rendering subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellChange {
    pub x: u8,
    pub y: u8,
    pub value: CellValue,
}

/// Direction of a 90° piece rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotateDirection {
    Clockwise,
    CounterClockwise,
}

impl RotateDirection {
    /// Parse direction from string (case-insensitive)
    ///
    /// Accepts `cw`/`clockwise`/`right` and `ccw`/`counterclockwise`/`left`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tetrecs_types::RotateDirection;
    ///
    /// assert_eq!(RotateDirection::from_str("Right"), Some(RotateDirection::Clockwise));
    /// assert_eq!(RotateDirection::from_str("ccw"), Some(RotateDirection::CounterClockwise));
    /// assert_eq!(RotateDirection::from_str("up"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cw" | "clockwise" | "right" => Some(RotateDirection::Clockwise),
            "ccw" | "counterclockwise" | "left" => Some(RotateDirection::CounterClockwise),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RotateDirection::Clockwise => "cw",
            RotateDirection::CounterClockwise => "ccw",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            RotateDirection::Clockwise => RotateDirection::CounterClockwise,
            RotateDirection::CounterClockwise => RotateDirection::Clockwise,
        }
    }
}

/// Lifecycle of one game instance: `Idle -> Running -> GameOver`.
///
/// `GameOver` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Running,
    GameOver,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::GameOver => "gameOver",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a game reached `GameOver`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameOverReason {
    /// The last life was lost to a timeout.
    LivesExhausted,
    /// The turn timer could not be scheduled.
    SchedulerExhausted,
    /// The player left the game.
    Abandoned,
}

impl GameOverReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameOverReason::LivesExhausted => "livesExhausted",
            GameOverReason::SchedulerExhausted => "schedulerExhausted",
            GameOverReason::Abandoned => "abandoned",
        }
    }
}

/// Point-in-time scoring values of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameStats {
    pub score: u32,
    pub level: u32,
    pub lives: u32,
    pub multiplier: u32,
}

impl GameStats {
    pub fn new(lives: u32) -> Self {
        Self {
            score: 0,
            level: 0,
            lives,
            multiplier: BASE_MULTIPLIER,
        }
    }
}

impl Default for GameStats {
    fn default() -> Self {
        Self::new(STARTING_LIVES)
    }
}

/// Semantic event kinds for notification collaborators (audio, effects)
///
/// The first five are the kinds a sound or effect layer reacts to; the remaining ones carry
/// state deltas for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Placed,
    Rejected,
    LineCleared,
    LifeLost,
    GameOver,
    Started,
    CellChanged,
    PiecesChanged,
    StatsChanged,
    TimerReset,
}

impl EventKind {
    /// Convert to camelCase string for the adapter protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Placed => "placed",
            EventKind::Rejected => "rejected",
            EventKind::LineCleared => "lineCleared",
            EventKind::LifeLost => "lifeLost",
            EventKind::GameOver => "gameOver",
            EventKind::Started => "started",
            EventKind::CellChanged => "cellChanged",
            EventKind::PiecesChanged => "piecesChanged",
            EventKind::StatsChanged => "statsChanged",
            EventKind::TimerReset => "timerReset",
        }
    }
}
