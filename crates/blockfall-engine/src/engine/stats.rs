use std::time::Duration;

/// Points per single-lock line clear, before level and mode multipliers.
///
/// Index corresponds to number of lines cleared simultaneously:
/// - 0 lines: 0 points
/// - 1 line: 100 points
/// - 2 lines: 300 points
/// - 3 lines: 500 points
/// - 4 lines (Tetris): 800 points
pub const LINE_CLEAR_SCORES: [u64; 5] = [0, 100, 300, 500, 800];

/// Lines cleared by a single lock that count as a Tetris.
pub const TETRIS_LINES: usize = 4;

/// Lines needed per level.
pub const LINES_PER_LEVEL: usize = 10;

/// Fastest drop interval of the default speed curve.
pub const MIN_DROP_INTERVAL: Duration = Duration::from_millis(100);

#[must_use]
pub const fn is_tetris(lines: usize) -> bool {
    lines == TETRIS_LINES
}

/// Base points for clearing `lines` rows with one lock.
///
/// Clears of more than four rows can only come from unusual board states and
/// score as a Tetris.
#[must_use]
pub const fn base_line_clear_score(lines: usize) -> u64 {
    if lines < LINE_CLEAR_SCORES.len() {
        LINE_CLEAR_SCORES[lines]
    } else {
        LINE_CLEAR_SCORES[TETRIS_LINES]
    }
}

/// Points awarded for a clear: base score × level × mode multiplier, rounded.
///
/// # Example
///
/// ```
/// use blockfall_engine::line_clear_score;
///
/// assert_eq!(line_clear_score(4, 1, 1.0), 800);
/// assert_eq!(line_clear_score(4, 3, 1.0), 2400);
/// assert_eq!(line_clear_score(1, 2, 1.5), 300);
/// ```
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn line_clear_score(lines: usize, level: u32, multiplier: f64) -> u64 {
    let base = base_line_clear_score(lines) * u64::from(level);
    (base as f64 * multiplier).round() as u64
}

/// Default speed curve: `max(100ms, 1000ms - level × 50ms)`.
#[must_use]
pub fn classic_drop_interval(level: u32) -> Duration {
    let millis = 1000_u64.saturating_sub(u64::from(level) * 50);
    Duration::from_millis(millis).max(MIN_DROP_INTERVAL)
}

/// What a single lock contributed to the statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LockOutcome {
    pub lines: usize,
    pub points: u64,
    pub levels_gained: u32,
}

/// Score, level and clear statistics of a session.
///
/// - **Score**: points from line clears
/// - **Level**: starting level plus one per 10 lines (unless progression is off)
/// - **Pieces**: spawned and locked counts
/// - **Line clear distribution**: singles, doubles, triples and Tetrises
///
/// # Scoring
///
/// No combo, back-to-back or T-spin bonuses. Points use the level in effect
/// before the clear.
///
/// # Example
///
/// ```
/// use blockfall_engine::GameStats;
///
/// let mut stats = GameStats::new(1);
/// let outcome = stats.record_lock(4, 1.0, true);
///
/// assert_eq!(outcome.points, 800);
/// assert_eq!(stats.score(), 800);
/// assert_eq!(stats.line_cleared_counter()[4], 1);
/// ```
#[derive(Debug, Clone)]
pub struct GameStats {
    score: u64,
    level: u32,
    total_lines: usize,
    pieces_spawned: usize,
    pieces_locked: usize,
    line_cleared_counter: [usize; 5],
}

impl GameStats {
    #[must_use]
    pub const fn new(starting_level: u32) -> Self {
        Self {
            score: 0,
            level: starting_level,
            total_lines: 0,
            pieces_spawned: 0,
            pieces_locked: 0,
            line_cleared_counter: [0; 5],
        }
    }

    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub const fn total_lines(&self) -> usize {
        self.total_lines
    }

    #[must_use]
    pub const fn pieces_spawned(&self) -> usize {
        self.pieces_spawned
    }

    #[must_use]
    pub const fn pieces_locked(&self) -> usize {
        self.pieces_locked
    }

    /// Number of Tetrises (and larger clears).
    #[must_use]
    pub const fn tetrises(&self) -> usize {
        self.line_cleared_counter[TETRIS_LINES]
    }

    /// Returns a histogram of locks by lines cleared.
    ///
    /// - `[0]`: locks without a clear
    /// - `[1]`..`[3]`: singles, doubles and triples
    /// - `[4]`: Tetrises
    #[must_use]
    pub const fn line_cleared_counter(&self) -> &[usize; 5] {
        &self.line_cleared_counter
    }

    pub(crate) fn record_spawn(&mut self) {
        self.pieces_spawned += 1;
    }

    /// Updates statistics after a lock that cleared `lines` rows.
    pub fn record_lock(
        &mut self,
        lines: usize,
        multiplier: f64,
        level_progression: bool,
    ) -> LockOutcome {
        self.pieces_locked += 1;
        self.line_cleared_counter[lines.min(TETRIS_LINES)] += 1;
        if lines == 0 {
            return LockOutcome::default();
        }

        let points = line_clear_score(lines, self.level, multiplier);
        let before = self.total_lines;
        self.score += points;
        self.total_lines += lines;

        let mut levels_gained = 0;
        if level_progression {
            let crossed = self.total_lines / LINES_PER_LEVEL - before / LINES_PER_LEVEL;
            levels_gained = u32::try_from(crossed).unwrap_or(u32::MAX);
            self.level = self.level.saturating_add(levels_gained);
        }

        LockOutcome {
            lines,
            points,
            levels_gained,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_table() {
        assert_eq!(line_clear_score(0, 1, 1.0), 0);
        assert_eq!(line_clear_score(1, 1, 1.0), 100);
        assert_eq!(line_clear_score(2, 1, 1.0), 300);
        assert_eq!(line_clear_score(3, 1, 1.0), 500);
        assert_eq!(line_clear_score(4, 1, 1.0), 800);
        assert_eq!(line_clear_score(4, 3, 1.0), 2400);
        assert_eq!(line_clear_score(6, 1, 1.0), 800);
    }

    #[test]
    fn test_score_multiplier() {
        assert_eq!(line_clear_score(1, 1, 1.5), 150);
        assert_eq!(line_clear_score(2, 1, 1.2), 360);
        assert_eq!(line_clear_score(4, 2, 1.5), 2400);
    }

    #[test]
    fn test_is_tetris() {
        assert!(is_tetris(4));
        assert!(!is_tetris(3));
        assert!(!is_tetris(5));
    }

    #[test]
    fn test_classic_drop_interval() {
        assert_eq!(classic_drop_interval(1), Duration::from_millis(950));
        assert_eq!(classic_drop_interval(10), Duration::from_millis(500));
        assert_eq!(classic_drop_interval(18), Duration::from_millis(100));
        assert_eq!(classic_drop_interval(30), Duration::from_millis(100));
    }

    #[test]
    fn test_level_up_every_ten_lines() {
        let mut stats = GameStats::new(1);
        for _ in 0..2 {
            stats.record_lock(4, 1.0, true);
        }
        assert_eq!(stats.level(), 1);
        assert_eq!(stats.total_lines(), 8);

        let outcome = stats.record_lock(2, 1.0, true);
        assert_eq!(outcome.levels_gained, 1);
        assert_eq!(stats.level(), 2);

        // points use the level in effect before the clear
        assert_eq!(outcome.points, 300);
        assert_eq!(stats.record_lock(1, 1.0, true).points, 200);
    }

    #[test]
    fn test_level_progression_disabled() {
        let mut stats = GameStats::new(1);
        for _ in 0..5 {
            stats.record_lock(4, 1.0, false);
        }
        assert_eq!(stats.total_lines(), 20);
        assert_eq!(stats.level(), 1);
    }

    #[test]
    fn test_line_cleared_counter() {
        let mut stats = GameStats::new(1);
        stats.record_lock(0, 1.0, true);
        stats.record_lock(1, 1.0, true);
        stats.record_lock(4, 1.0, true);
        assert_eq!(stats.line_cleared_counter(), &[1, 1, 0, 0, 1]);
        assert_eq!(stats.pieces_locked(), 3);
        assert_eq!(stats.tetrises(), 1);
    }
}
