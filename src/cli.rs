//! Command-line parsing and the greedy placement planner used by the binaries.

use anyhow::{anyhow, Result};

use crate::core::{create_piece, detect_full_lines, GameSnapshot, Grid, Piece, PieceSnapshot};
use crate::types::{RotateDirection, EMPTY_CELL};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    /// Start the game without waiting for a controller's `start` command
    pub autostart: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoplayArgs {
    pub seed: Option<u32>,
    pub max_turns: u64,
}

impl Default for AutoplayArgs {
    fn default() -> Self {
        Self {
            seed: None,
            max_turns: 500,
        }
    }
}

pub fn parse_run_args(args: &[String]) -> Result<RunArgs> {
    let mut run = RunArgs::default();
    for arg in args {
        match arg.as_str() {
            "--autostart" => run.autostart = true,
            other => return Err(anyhow!("tetrecs: unknown argument: {}", other)),
        }
    }
    Ok(run)
}

pub fn parse_autoplay_args(args: &[String]) -> Result<AutoplayArgs> {
    let mut parsed = AutoplayArgs::default();
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("autoplay: missing value for --seed"))?;
                let seed = v
                    .parse::<u32>()
                    .map_err(|_| anyhow!("autoplay: invalid --seed value: {}", v))?;
                parsed.seed = Some(seed);
            }
            "--max-turns" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("autoplay: missing value for --max-turns"))?;
                parsed.max_turns = v
                    .parse::<u64>()
                    .map_err(|_| anyhow!("autoplay: invalid --max-turns value: {}", v))?;
            }
            other => {
                return Err(anyhow!("autoplay: unknown argument: {}", other));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

/// One turn chosen by [`plan_turn`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    /// Swap current and next before anything else
    pub swap: bool,
    /// Clockwise quarter turns to apply to the piece being placed
    pub rotations: u8,
    pub x: i8,
    pub y: i8,
    /// Blocks the placement clears
    pub blocks: u32,
}

impl Plan {
    /// Rotation requests that reach the planned orientation with the fewest steps.
    pub fn rotation_steps(&self) -> impl Iterator<Item = RotateDirection> {
        let (count, direction) = match self.rotations % 4 {
            3 => (1, RotateDirection::CounterClockwise),
            n => (n, RotateDirection::Clockwise),
        };
        std::iter::repeat(direction).take(count as usize)
    }
}

/// Pick the legal placement that clears the most blocks
///
/// Considers every orientation of the current piece and, after a swap, of the next piece. Ties
/// keep the first candidate in the order no swap, fewest rotations, row-major anchor. Returns
/// `None` when nothing fits or the game is not running.
pub fn plan_turn(snapshot: &GameSnapshot) -> Option<Plan> {
    if !snapshot.playable() {
        return None;
    }

    let mut grid = Grid::new(snapshot.width, snapshot.height).ok()?;
    for y in 0..snapshot.height {
        for x in 0..snapshot.width {
            let value = snapshot.cell(x, y)?;
            if value != EMPTY_CELL {
                grid.set(x as i8, y as i8, value).ok()?;
            }
        }
    }

    let mut best: Option<Plan> = None;
    for (swap, piece) in [(false, snapshot.current?), (true, snapshot.next?)] {
        let Some(orientations) = orientations(&piece) else {
            continue;
        };
        for (rotations, piece) in orientations.iter().enumerate() {
            for y in 0..snapshot.height as i8 {
                for x in 0..snapshot.width as i8 {
                    if !grid.can_place(piece, x, y) {
                        continue;
                    }
                    let mut trial = grid.clone();
                    if trial.place(piece, x, y).is_err() {
                        continue;
                    }
                    let blocks = detect_full_lines(&trial).cells.len() as u32;
                    if best.map_or(true, |b| blocks > b.blocks) {
                        best = Some(Plan {
                            swap,
                            rotations: rotations as u8,
                            x,
                            y,
                            blocks,
                        });
                    }
                }
            }
        }
    }
    best
}

/// The four orientations reachable from `snapshot`, starting with its own.
fn orientations(snapshot: &PieceSnapshot) -> Option<[Piece; 4]> {
    let mut piece = create_piece(snapshot.id).ok()?;
    for _ in 0..4 {
        if piece.mask() == &snapshot.mask {
            break;
        }
        piece = piece.rotated(RotateDirection::Clockwise);
    }
    if piece.mask() != &snapshot.mask {
        return None;
    }

    let mut out = [piece; 4];
    for k in 1..4 {
        out[k] = out[k - 1].rotated(RotateDirection::Clockwise);
    }
    Some(out)
}
