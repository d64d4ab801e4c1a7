//! Scoring module - multiplier scoring, levels and the turn timer
//!
//! A clearing turn scores `lines * blocks * 10 * multiplier` and raises the multiplier by one.
//! A turn that clears nothing resets the multiplier to 1 and leaves score and level alone.
//! Level is `score / 1000`. The turn timer shrinks by 500ms per level down to a 2500ms floor.

use crate::types::{
    BASE_MULTIPLIER, BASE_TIMER_DELAY_MS, MIN_TIMER_DELAY_MS, POINTS_PER_BLOCK, SCORE_PER_LEVEL,
    TIMER_DELAY_STEP_MS,
};

/// Score calculation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreUpdate {
    pub score: u32,
    pub multiplier: u32,
    pub level: u32,
    /// Points added by this turn
    pub delta: u32,
    /// Whether the turn cleared anything (the clear-effect signal)
    pub cleared: bool,
}

/// Apply one turn's clear to the running score.
///
/// Pure: the same inputs always give the same update.
pub fn apply(score: u32, multiplier: u32, lines_cleared: u32, blocks_cleared: u32) -> ScoreUpdate {
    if lines_cleared == 0 {
        return ScoreUpdate {
            score,
            multiplier: BASE_MULTIPLIER,
            level: level_for_score(score),
            delta: 0,
            cleared: false,
        };
    }

    let delta = lines_cleared
        .saturating_mul(blocks_cleared)
        .saturating_mul(POINTS_PER_BLOCK)
        .saturating_mul(multiplier);
    let new_score = score.saturating_add(delta);

    ScoreUpdate {
        score: new_score,
        multiplier: multiplier.saturating_add(1),
        level: level_for_score(new_score),
        delta,
        cleared: true,
    }
}

/// Level management
/// One level per 1000 points
pub fn level_for_score(score: u32) -> u32 {
    score / SCORE_PER_LEVEL
}

/// Get the turn timer for a level (in milliseconds)
///
/// Never below the 2500ms floor; there is no upper level limit.
pub fn compute_delay_ms(level: u32) -> u32 {
    BASE_TIMER_DELAY_MS
        .saturating_sub(level.saturating_mul(TIMER_DELAY_STEP_MS))
        .max(MIN_TIMER_DELAY_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_table() {
        // (score, multiplier, lines, blocks) => (score, multiplier, level, delta)
        let cases: [((u32, u32, u32, u32), (u32, u32, u32, u32)); 6] = [
            ((0, 1, 1, 5), (50, 2, 0, 50)),
            ((950, 2, 2, 9), (1310, 3, 1, 360)),
            ((0, 3, 1, 5), (150, 4, 0, 150)),
            ((990, 1, 1, 1), (1000, 2, 1, 10)),
            ((4200, 7, 0, 0), (4200, 1, 4, 0)),
            ((10, 1, 0, 0), (10, 1, 0, 0)),
        ];

        for ((score, multiplier, lines, blocks), expected) in cases {
            let update = apply(score, multiplier, lines, blocks);
            assert_eq!(
                (update.score, update.multiplier, update.level, update.delta),
                expected,
                "apply({score}, {multiplier}, {lines}, {blocks})"
            );
            assert_eq!(update.cleared, lines > 0);
        }
    }

    #[test]
    fn test_no_clear_resets_multiplier() {
        for multiplier in [1, 2, 5, 40] {
            assert_eq!(apply(300, multiplier, 0, 0).multiplier, 1);
        }
    }

    #[test]
    fn test_score_saturates() {
        let update = apply(u32::MAX - 5, 1000, 10, 25);
        assert_eq!(update.score, u32::MAX);
        assert!(update.score >= u32::MAX - 5);
    }

    #[test]
    fn test_level_calculation() {
        assert_eq!(level_for_score(0), 0);
        assert_eq!(level_for_score(999), 0);
        assert_eq!(level_for_score(1000), 1);
        assert_eq!(level_for_score(1310), 1);
        assert_eq!(level_for_score(25_000), 25);
    }

    #[test]
    fn test_delays() {
        assert_eq!(compute_delay_ms(0), 12_000);
        assert_eq!(compute_delay_ms(1), 11_500);
        assert_eq!(compute_delay_ms(18), 3_000);
        assert_eq!(compute_delay_ms(19), 2_500);
        assert_eq!(compute_delay_ms(20), 2_500);
        assert_eq!(compute_delay_ms(u32::MAX), 2_500);
    }

    #[test]
    fn test_delay_is_non_increasing() {
        let mut previous = compute_delay_ms(0);
        for level in 1..100 {
            let delay = compute_delay_ms(level);
            assert!(delay <= previous);
            assert!((2_500..=12_000).contains(&delay));
            previous = delay;
        }
    }
}
