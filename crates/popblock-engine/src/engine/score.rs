use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::piece::ActivePiece;

/// Base points for simultaneous line clears, indexed by row count.
///
/// Clearing more than four rows at once is not possible with standard pieces;
/// such a clear scores no base points.
const LINE_CLEAR_BASE: [u64; 5] = [0, 100, 300, 500, 800];

/// Points added per consecutive clearing lock before the current one.
const COMBO_BONUS: u64 = 50;

/// Points per occupied cell of a locked piece.
const POINTS_PER_CELL: u64 = 10;

/// Cleared rows needed to advance one level.
const LINES_PER_LEVEL: u32 = 10;

/// Level-derived score multiplier, stored in tenths.
///
/// Level `n` maps to `1.0 + (n - 1) * 0.1`. Keeping it as an integer number of
/// tenths makes every floored score increment exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Multiplier(u32);

impl Default for Multiplier {
    fn default() -> Self {
        Self::ONE
    }
}

impl Multiplier {
    pub const ONE: Self = Self(10);

    #[must_use]
    pub const fn for_level(level: u32) -> Self {
        Self(10 + level.saturating_sub(1))
    }

    /// Multiplier in tenths (`12` is `x1.2`).
    #[must_use]
    pub const fn tenths(self) -> u32 {
        self.0
    }

    /// Scales `points` and rounds down.
    #[must_use]
    pub const fn apply(self, points: u64) -> u64 {
        points * self.0 as u64 / 10
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 10.0
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}.{}", self.0 / 10, self.0 % 10)
    }
}

/// Cumulative scoring state of one game.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScoreState {
    pub score: u64,
    pub level: u32,
    pub lines_cleared: u32,
    pub combo: u32,
    pub multiplier: Multiplier,
    pub pieces_locked: u32,
    /// Locks by number of rows cleared; clears of more than 4 rows count in the last bucket.
    pub clears: [u32; 5],
}

impl Default for ScoreState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score: 0,
            level: 1,
            lines_cleared: 0,
            combo: 0,
            multiplier: Multiplier::ONE,
            pieces_locked: 0,
            clears: [0; 5],
        }
    }
}

/// Result of [`ScoreEngine::on_lines_cleared`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineClearScore {
    /// Points added to the score, combo bonus included.
    pub points: u64,
    /// Combo bonus before the multiplier.
    pub combo_bonus: u64,
    /// New level, if this clear crossed a level boundary.
    pub level_changed: Option<u32>,
}

/// Pure scoring state machine driven by lock and line-clear events.
///
/// # Scoring
///
/// - Each locked piece scores `cells * 10 * multiplier`
/// - A clear of `n` rows scores `(base[n] + combo * 50) * multiplier`, where
///   `combo` counts the consecutive clearing locks before this one
/// - A lock that clears nothing resets the combo
/// - Every 10 cleared rows raise the level by one and the multiplier by 0.1
///
/// All increments are rounded down.
///
/// # Example
///
/// ```
/// use popblock_engine::ScoreEngine;
///
/// let mut score = ScoreEngine::new();
/// score.on_lines_cleared(1);
/// score.on_lines_cleared(4);
///
/// // 100 for the single, 800 + 1 * 50 for the tetris
/// assert_eq!(score.state().score, 950);
/// assert_eq!(score.state().combo, 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScoreEngine {
    state: ScoreState,
}

impl ScoreEngine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ScoreState::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &ScoreState {
        &self.state
    }

    #[must_use]
    pub const fn level(&self) -> u32 {
        self.state.level
    }

    /// Scores a locked piece and returns the points added.
    pub fn on_piece_locked(&mut self, piece: &ActivePiece) -> u64 {
        let cells = piece.current_shape().occupied_count() as u64;
        let points = self.state.multiplier.apply(cells * POINTS_PER_CELL);
        self.state.score += points;
        self.state.pieces_locked += 1;
        points
    }

    /// Scores a lock that cleared `rows` rows.
    pub fn on_lines_cleared(&mut self, rows: usize) -> LineClearScore {
        let state = &mut self.state;
        state.clears[rows.min(state.clears.len() - 1)] += 1;
        if rows == 0 {
            state.combo = 0;
            return LineClearScore::default();
        }

        let base = LINE_CLEAR_BASE.get(rows).copied().unwrap_or(0);
        let combo_bonus = u64::from(state.combo) * COMBO_BONUS;
        let points = state.multiplier.apply(base + combo_bonus);
        state.score += points;
        state.lines_cleared += u32::try_from(rows).unwrap_or(u32::MAX);
        state.combo += 1;

        let level = state.lines_cleared / LINES_PER_LEVEL + 1;
        let level_changed = (level != state.level).then_some(level);
        state.level = level;
        state.multiplier = Multiplier::for_level(level);

        LineClearScore {
            points,
            combo_bonus,
            level_changed,
        }
    }

    pub fn reset(&mut self) {
        self.state = ScoreState::new();
    }
}
