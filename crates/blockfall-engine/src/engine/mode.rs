use std::{fmt, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Board, ConfigError, PieceKind};

use super::{
    sequencer::DEFAULT_LOOKAHEAD,
    stats::{MIN_DROP_INTERVAL, classic_drop_interval},
};

/// Game mode identifier, used for score submission and rankings.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    #[display("classic")]
    Classic,
    #[display("speed")]
    Speed,
    #[display("battle")]
    Battle,
    #[display("puzzle")]
    Puzzle,
    #[display("adventure")]
    Adventure,
    #[display("zen")]
    Zen,
}

impl GameMode {
    pub const ALL: [Self; 6] = [
        Self::Classic,
        Self::Speed,
        Self::Battle,
        Self::Puzzle,
        Self::Adventure,
        Self::Zen,
    ];
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A new piece collided at its spawn position, or garbage pushed blocks off the top.
    #[display("top out")]
    TopOut,
    /// The mode's time limit expired.
    #[display("time up")]
    TimeUp,
    /// The mode's objective was reached.
    #[display("objective complete")]
    Objective,
    /// The mode's piece allowance ran out.
    #[display("out of pieces")]
    OutOfPieces,
    /// The opponent won.
    #[display("defeated")]
    Defeated,
    /// Ended from outside the session.
    #[display("quit")]
    Quit,
}

/// Inputs available to a speed curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedInput {
    pub level: u32,
    /// Play time, excluding pauses.
    pub elapsed: Duration,
    pub time_limit: Option<Duration>,
}

/// Maps the current level and play time to a gravity interval.
///
/// The engine re-evaluates the curve on every tick, so time-based curves are
/// supported as well as level-based ones.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use blockfall_engine::{SpeedCurve, SpeedInput};
///
/// let curve = SpeedCurve::classic();
/// let input = SpeedInput { level: 3, elapsed: Duration::ZERO, time_limit: None };
/// assert_eq!(curve.interval(input), Duration::from_millis(850));
///
/// let slow = SpeedCurve::from_speed_factor(Duration::from_secs(1), |_| 0.8);
/// assert_eq!(slow.interval(input), Duration::from_millis(1250));
/// ```
#[derive(Clone)]
pub struct SpeedCurve(Arc<dyn Fn(SpeedInput) -> Duration + Send + Sync>);

impl fmt::Debug for SpeedCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SpeedCurve(..)")
    }
}

impl Default for SpeedCurve {
    fn default() -> Self {
        Self::classic()
    }
}

impl SpeedCurve {
    pub fn new(f: impl Fn(SpeedInput) -> Duration + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// `max(100ms, 1000ms - level × 50ms)`.
    #[must_use]
    pub fn classic() -> Self {
        Self::new(|input| classic_drop_interval(input.level))
    }

    /// Divides `base` by a speed factor, never going below 100 ms.
    ///
    /// Non-positive factors are treated as "no gravity speed-up" (factor 1).
    pub fn from_speed_factor(
        base: Duration,
        factor: impl Fn(SpeedInput) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self::new(move |input| scale_interval(base, factor(input)))
    }

    /// Applies a speed factor on top of another curve.
    pub fn scaled_by(
        self,
        factor: impl Fn(SpeedInput) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self::new(move |input| scale_interval(self.interval(input), factor(input)))
    }

    #[must_use]
    pub fn interval(&self, input: SpeedInput) -> Duration {
        (self.0)(input)
    }
}

fn scale_interval(base: Duration, factor: f64) -> Duration {
    let factor = if factor.is_finite() && factor > 0.0 {
        factor
    } else {
        1.0
    };
    base.div_f64(factor).max(MIN_DROP_INTERVAL)
}

/// Per-session parameters produced once by a [`ModeStrategy`].
///
/// Construct with [`ModeConfig::new`] and adjust with the `with_*` methods.
#[derive(Debug, Clone)]
pub struct ModeConfig {
    pub game_mode: GameMode,
    pub rows: usize,
    pub cols: usize,
    pub starting_level: u32,
    pub score_multiplier: f64,
    pub speed_curve: SpeedCurve,
    /// Ends the session with [`EndReason::TimeUp`] when play time reaches it,
    /// and enables [`ModeStrategy::on_timer_tick`].
    pub time_limit: Option<Duration>,
    pub hold_enabled: bool,
    pub lookahead: usize,
    /// Whether the level increases every 10 lines.
    pub level_progression: bool,
    /// Clears the board instead of ending the session on a spawn collision.
    pub suppress_top_out_game_over: bool,
    /// Kinds shuffled into each bag.
    pub bag: Vec<PieceKind>,
    /// Board to start from instead of an empty one.
    pub initial_board: Option<Board>,
}

impl ModeConfig {
    /// Classic defaults: 20×10, level 1, ×1.0, classic speed curve, hold on,
    /// three-piece lookahead, all seven kinds.
    #[must_use]
    pub fn new(game_mode: GameMode) -> Self {
        Self {
            game_mode,
            rows: Board::DEFAULT_ROWS,
            cols: Board::DEFAULT_COLS,
            starting_level: 1,
            score_multiplier: 1.0,
            speed_curve: SpeedCurve::classic(),
            time_limit: None,
            hold_enabled: true,
            lookahead: DEFAULT_LOOKAHEAD,
            level_progression: true,
            suppress_top_out_game_over: false,
            bag: PieceKind::ALL.to_vec(),
            initial_board: None,
        }
    }

    #[must_use]
    pub fn with_board_size(self, rows: usize, cols: usize) -> Self {
        Self { rows, cols, ..self }
    }

    #[must_use]
    pub fn with_starting_level(self, starting_level: u32) -> Self {
        Self {
            starting_level,
            ..self
        }
    }

    #[must_use]
    pub fn with_score_multiplier(self, score_multiplier: f64) -> Self {
        Self {
            score_multiplier,
            ..self
        }
    }

    #[must_use]
    pub fn with_speed_curve(self, speed_curve: SpeedCurve) -> Self {
        Self {
            speed_curve,
            ..self
        }
    }

    #[must_use]
    pub fn with_time_limit(self, time_limit: Duration) -> Self {
        Self {
            time_limit: Some(time_limit),
            ..self
        }
    }

    #[must_use]
    pub fn with_hold_enabled(self, hold_enabled: bool) -> Self {
        Self {
            hold_enabled,
            ..self
        }
    }

    #[must_use]
    pub fn with_lookahead(self, lookahead: usize) -> Self {
        Self { lookahead, ..self }
    }

    #[must_use]
    pub fn with_level_progression(self, level_progression: bool) -> Self {
        Self {
            level_progression,
            ..self
        }
    }

    #[must_use]
    pub fn with_suppress_top_out_game_over(self, suppress_top_out_game_over: bool) -> Self {
        Self {
            suppress_top_out_game_over,
            ..self
        }
    }

    #[must_use]
    pub fn with_bag(self, bag: Vec<PieceKind>) -> Self {
        Self { bag, ..self }
    }

    /// Starts from `board`; the board dimensions replace `rows` and `cols`.
    #[must_use]
    pub fn with_initial_board(self, board: Board) -> Self {
        Self {
            rows: board.rows(),
            cols: board.cols(),
            initial_board: Some(board),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::InvalidBoardSize {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if let Some(board) = &self.initial_board
            && (board.rows() != self.rows || board.cols() != self.cols)
        {
            return Err(ConfigError::InitialBoardMismatch {
                rows: self.rows,
                cols: self.cols,
                actual_rows: board.rows(),
                actual_cols: board.cols(),
            });
        }
        if self.bag.is_empty() {
            return Err(ConfigError::EmptyBag);
        }
        if self.lookahead == 0 {
            return Err(ConfigError::ZeroLookahead);
        }
        if self.starting_level == 0 {
            return Err(ConfigError::ZeroStartingLevel);
        }
        if !(self.score_multiplier.is_finite() && self.score_multiplier > 0.0) {
            return Err(ConfigError::InvalidScoreMultiplier {
                multiplier: self.score_multiplier,
            });
        }
        if self.time_limit == Some(Duration::ZERO) {
            return Err(ConfigError::ZeroTimeLimit);
        }
        Ok(())
    }
}

/// Requests a mode hook makes of the session.
///
/// The session applies them after the hook returns: garbage is queued for
/// the opponent, then the session finishes or pauses.
#[derive(Debug, Default)]
pub struct ModeControl {
    pause: bool,
    finish: Option<EndReason>,
    garbage: usize,
}

impl ModeControl {
    pub fn request_pause(&mut self) {
        self.pause = true;
    }

    /// Ends the session once the hook returns. The first reason wins.
    pub fn finish(&mut self, reason: EndReason) {
        self.finish.get_or_insert(reason);
    }

    /// Queues garbage rows for the opponent.
    pub fn send_garbage(&mut self, lines: usize) {
        self.garbage += lines;
    }

    pub(crate) fn into_parts(self) -> (bool, Option<EndReason>, usize) {
        (self.pause, self.finish, self.garbage)
    }
}

/// A single-lock line clear, as reported to [`ModeStrategy::on_line_cleared`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineClear {
    pub lines: usize,
    pub total_lines: usize,
    pub is_tetris: bool,
    pub points: u64,
    pub level: u32,
}

/// Final statistics of an ended session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalStats {
    pub game_mode: GameMode,
    pub score: u64,
    pub level: u32,
    pub lines: usize,
    pub pieces: usize,
    pub tetrises: usize,
    pub elapsed_ms: u64,
    pub reason: EndReason,
}

impl FinalStats {
    /// The tuple submitted to the score backend.
    #[must_use]
    pub fn score_submission(&self) -> ScoreSubmission {
        ScoreSubmission {
            score: self.score,
            level: self.level,
            lines: self.lines,
            game_mode: self.game_mode,
        }
    }
}

/// Score record sent to the ranking backend on game over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub score: u64,
    pub level: u32,
    #[serde(default)]
    pub lines: usize,
    pub game_mode: GameMode,
}

/// Policy object for a game mode.
///
/// [`Self::config`] is called once when the session is built. The hooks are
/// notifications: the session never inspects the strategy's state, and a hook
/// affects the session only through the [`ModeControl`] it receives.
pub trait ModeStrategy: fmt::Debug {
    fn config(&self) -> ModeConfig;

    fn on_game_start(&mut self, _control: &mut ModeControl) {}

    fn on_piece_spawned(&mut self, _kind: PieceKind, _control: &mut ModeControl) {}

    fn on_line_cleared(&mut self, _clear: &LineClear, _control: &mut ModeControl) {}

    /// Called once per whole second of play time, and once when the time
    /// limit is reached (with `remaining` zero). Only for modes with a time limit.
    fn on_timer_tick(
        &mut self,
        _remaining: Duration,
        _elapsed: Duration,
        _control: &mut ModeControl,
    ) {
    }

    fn on_game_over(&mut self, _stats: &FinalStats) {}

    /// Short human-readable progress line, such as "3/10 lines".
    fn progress(&self) -> Option<String> {
        None
    }
}

/// Plain marathon rules with no hooks.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClassicRules;

impl ModeStrategy for ClassicRules {
    fn config(&self) -> ModeConfig {
        ModeConfig::new(GameMode::Classic)
    }
}
