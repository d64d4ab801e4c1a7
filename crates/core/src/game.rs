//! Game module - the turn state machine
//!
//! A [`Game`] owns the grid, the scoring state and the piece sequencer for one game instance and
//! moves through `Idle -> Running -> GameOver`. Every mutating operation is one atomic turn (or a
//! non-turn piece adjustment) and records what changed as [`GameEvent`]s, drained with
//! [`Game::take_events`].
//!
//! The game never sleeps or schedules anything itself: operations report the turn timer delay and
//! the runtime arms it. A timer expiry is delivered back through [`Game::on_timer_expiry`].

use crate::error::GameError;
use crate::events::GameEvent;
use crate::grid::Grid;
use crate::line_clear::{self, detect_full_lines};
use crate::pieces::Piece;
use crate::rng::PieceSequencer;
use crate::scoring::{self, compute_delay_ms};
use crate::snapshot::GameSnapshot;
use crate::types::{
    CellChange, GameOverReason, GameStats, Phase, RotateDirection, BASE_MULTIPLIER, EMPTY_CELL,
    GRID_HEIGHT, GRID_WIDTH, STARTING_LIVES,
};

/// Construction parameters for a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub width: u8,
    pub height: u8,
    pub seed: u32,
    /// Clamped to at least 1
    pub starting_lives: u32,
    /// Best score known before this game, as read from persistence
    pub high_score: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            seed: 1,
            starting_lives: STARTING_LIVES,
            high_score: 0,
        }
    }
}

impl GameConfig {
    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

/// What a successful placement turn did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementOutcome {
    /// The piece that was committed
    pub piece: Piece,
    pub lines_cleared: u32,
    pub blocks_cleared: u32,
    /// Points scored by this turn
    pub points: u32,
    pub stats: GameStats,
    /// Delay of the turn timer armed for the next turn
    pub delay_ms: u32,
}

/// What a timeout turn did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutOutcome {
    /// A life was lost and a new turn timer must be armed.
    Continue { lives: u32, delay_ms: u32 },
    /// The last life was lost. No timer may be armed again.
    GameOver { final_score: u32 },
}

/// One game instance
#[derive(Debug, Clone)]
pub struct Game {
    grid: Grid,
    sequencer: PieceSequencer,
    stats: GameStats,
    phase: Phase,
    high_score: u32,
    turn: u64,
    game_over_reason: Option<GameOverReason>,
    events: Vec<GameEvent>,
}

impl Game {
    /// Create an idle game with an empty grid
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        let grid = Grid::new(config.width, config.height)?;
        Ok(Self::with_grid(grid, config))
    }

    /// Create an idle game on a prepared grid. `config.width`/`config.height` are ignored.
    pub fn with_grid(grid: Grid, config: GameConfig) -> Self {
        Self {
            grid,
            sequencer: PieceSequencer::new(config.seed),
            stats: GameStats::new(config.starting_lives.max(1)),
            phase: Phase::Idle,
            high_score: config.high_score,
            turn: 0,
            game_over_reason: None,
            events: Vec::new(),
        }
    }

    fn require(&self, phase: Phase, operation: &'static str) -> Result<(), GameError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(GameError::InvalidStateTransition {
                operation,
                phase: self.phase,
            })
        }
    }

    /// `Idle -> Running`. Returns the delay of the first turn timer.
    pub fn start(&mut self) -> Result<u32, GameError> {
        self.require(Phase::Idle, "start")?;
        self.phase = Phase::Running;

        let delay_ms = self.timer_delay_ms();
        self.events.push(GameEvent::Started { delay_ms });
        self.events.push(GameEvent::StatsChanged(self.stats));
        self.push_pieces();
        Ok(delay_ms)
    }

    /// Try to commit the current piece centered on (x, y)
    ///
    /// On success this is a full turn: commit, clear, score, advance, timer reset. A rejected
    /// attempt changes nothing and the running timer keeps counting.
    pub fn attempt_placement(&mut self, x: i8, y: i8) -> Result<PlacementOutcome, GameError> {
        self.require(Phase::Running, "place a piece")?;
        let piece = self.sequencer.current();

        if !self.grid.in_bounds(x, y) {
            return Err(self.reject(
                x,
                y,
                piece,
                GameError::OutOfBounds {
                    x,
                    y,
                    width: self.grid.width(),
                    height: self.grid.height(),
                },
            ));
        }

        let changes = match self.grid.place(&piece, x, y) {
            Ok(changes) => changes,
            Err(err) => return Err(self.reject(x, y, piece, err)),
        };
        self.events
            .extend(changes.iter().copied().map(GameEvent::CellChanged));
        self.events.push(GameEvent::Placed {
            x,
            y,
            piece: piece.id(),
        });

        let clear = detect_full_lines(&self.grid);
        let blocks = line_clear::clear(&mut self.grid, &clear.cells);
        let lines = clear.lines_count();
        if !clear.is_empty() {
            self.events.extend(clear.cells.iter().map(|coord| {
                GameEvent::CellChanged(CellChange {
                    x: coord.x,
                    y: coord.y,
                    value: EMPTY_CELL,
                })
            }));
            self.events.push(GameEvent::LinesCleared {
                cells: clear.cells,
                lines,
                blocks,
            });
        }

        let update = scoring::apply(self.stats.score, self.stats.multiplier, lines, blocks);
        self.update_stats(GameStats {
            score: update.score,
            level: update.level,
            multiplier: update.multiplier,
            ..self.stats
        });

        self.sequencer.advance();
        self.push_pieces();

        let delay_ms = self.finish_turn();
        Ok(PlacementOutcome {
            piece,
            lines_cleared: lines,
            blocks_cleared: blocks,
            points: update.delta,
            stats: self.stats,
            delay_ms,
        })
    }

    fn reject(&mut self, x: i8, y: i8, piece: Piece, error: GameError) -> GameError {
        self.events.push(GameEvent::Rejected {
            x,
            y,
            piece: piece.id(),
            error,
        });
        error
    }

    /// The turn timer fired: lose a life and forfeit the current piece
    pub fn on_timer_expiry(&mut self) -> Result<TimeoutOutcome, GameError> {
        self.require(Phase::Running, "expire the turn timer")?;

        let lives = self.stats.lives.saturating_sub(1);
        self.events.push(GameEvent::LifeLost { lives });
        self.update_stats(GameStats {
            lives,
            multiplier: BASE_MULTIPLIER,
            ..self.stats
        });

        if lives == 0 {
            self.turn += 1;
            let final_score = self.finish(GameOverReason::LivesExhausted);
            return Ok(TimeoutOutcome::GameOver { final_score });
        }

        self.sequencer.advance();
        self.push_pieces();
        let delay_ms = self.finish_turn();
        Ok(TimeoutOutcome::Continue { lives, delay_ms })
    }

    /// Rotate the current piece. Not a turn: the timer is untouched.
    pub fn rotate_current(&mut self, direction: RotateDirection) -> Result<Piece, GameError> {
        self.require(Phase::Running, "rotate")?;
        let piece = self.sequencer.rotate_current(direction);
        self.push_pieces();
        Ok(piece)
    }

    /// Exchange current and next. Not a turn: the timer is untouched.
    pub fn swap_pieces(&mut self) -> Result<(Piece, Piece), GameError> {
        self.require(Phase::Running, "swap pieces")?;
        let pair = self.sequencer.swap();
        self.push_pieces();
        Ok(pair)
    }

    /// Leave a running game. Returns the final score.
    pub fn abandon(&mut self) -> Result<u32, GameError> {
        self.require(Phase::Running, "abandon")?;
        Ok(self.finish(GameOverReason::Abandoned))
    }

    /// The runtime could not arm the next turn timer. Returns the frozen final score.
    pub fn scheduler_exhausted(&mut self) -> Result<u32, GameError> {
        self.require(Phase::Running, "exhaust the scheduler")?;
        Ok(self.finish(GameOverReason::SchedulerExhausted))
    }

    fn finish(&mut self, reason: GameOverReason) -> u32 {
        self.phase = Phase::GameOver;
        self.game_over_reason = Some(reason);
        self.events.push(GameEvent::GameOver {
            final_score: self.stats.score,
            reason,
        });
        self.stats.score
    }

    fn finish_turn(&mut self) -> u32 {
        self.turn += 1;
        let delay_ms = self.timer_delay_ms();
        self.events.push(GameEvent::TimerReset {
            delay_ms,
            turn: self.turn,
        });
        delay_ms
    }

    fn update_stats(&mut self, stats: GameStats) {
        if stats == self.stats {
            return;
        }
        self.stats = stats;
        self.high_score = self.high_score.max(stats.score);
        self.events.push(GameEvent::StatsChanged(stats));
    }

    fn push_pieces(&mut self) {
        self.events.push(GameEvent::PiecesChanged {
            current: self.sequencer.current(),
            next: self.sequencer.next(),
        });
    }

    /// Drain the events recorded since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Turn timer for the current level
    pub fn timer_delay_ms(&self) -> u32 {
        compute_delay_ms(self.stats.level)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stats(&self) -> GameStats {
        self.stats
    }

    pub fn score(&self) -> u32 {
        self.stats.score
    }

    pub fn level(&self) -> u32 {
        self.stats.level
    }

    pub fn lives(&self) -> u32 {
        self.stats.lives
    }

    pub fn multiplier(&self) -> u32 {
        self.stats.multiplier
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn seed(&self) -> u32 {
        self.sequencer.seed()
    }

    pub fn game_over_reason(&self) -> Option<GameOverReason> {
        self.game_over_reason
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Piece in play; `None` until the game starts
    pub fn current_piece(&self) -> Option<Piece> {
        (self.phase != Phase::Idle).then(|| self.sequencer.current())
    }

    pub fn next_piece(&self) -> Option<Piece> {
        (self.phase != Phase::Idle).then(|| self.sequencer.next())
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            width: self.grid.width(),
            height: self.grid.height(),
            cells: self.grid.cells().to_vec(),
            phase: self.phase,
            stats: self.stats,
            high_score: self.high_score,
            current: self.current_piece().map(Into::into),
            next: self.next_piece().map(Into::into),
            turn: self.turn,
            seed: self.seed(),
            delay_ms: self.timer_delay_ms(),
            game_over_reason: self.game_over_reason,
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::with_grid(Grid::default(), GameConfig::default())
    }
}
