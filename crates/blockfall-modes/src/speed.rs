use std::{fmt, str::FromStr, time::Duration};

use blockfall_engine::{GameMode, ModeConfig, ModeStrategy, SpeedCurve, SpeedInput};

use crate::OptionError;

const SPEED_SCORE_MULTIPLIER: f64 = 1.5;

/// Length of a speed round.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeOption {
    OneMinute,
    #[default]
    TwoMinutes,
    ThreeMinutes,
    FiveMinutes,
}

impl TimeOption {
    pub const ALL: [Self; 4] = [
        Self::OneMinute,
        Self::TwoMinutes,
        Self::ThreeMinutes,
        Self::FiveMinutes,
    ];

    #[must_use]
    pub const fn seconds(self) -> u64 {
        match self {
            Self::OneMinute => 60,
            Self::TwoMinutes => 120,
            Self::ThreeMinutes => 180,
            Self::FiveMinutes => 300,
        }
    }

    #[must_use]
    pub const fn duration(self) -> Duration {
        Duration::from_secs(self.seconds())
    }
}

impl TryFrom<u64> for TimeOption {
    type Error = OptionError;

    fn try_from(seconds: u64) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|option| option.seconds() == seconds)
            .ok_or(OptionError::UnsupportedTimeLimit { seconds })
    }
}

impl FromStr for TimeOption {
    type Err = OptionError;

    /// Parses a number of seconds, with or without a trailing `s`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_end_matches('s');
        let seconds: u64 = digits
            .parse()
            .map_err(|_| OptionError::UnsupportedTimeLimit { seconds: 0 })?;
        Self::try_from(seconds)
    }
}

impl fmt::Display for TimeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.seconds())
    }
}

/// Gravity multiplier of a speed round.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, derive_more::FromStr,
)]
pub enum SpeedDifficulty {
    #[display("easy")]
    Easy,
    #[default]
    #[display("normal")]
    Normal,
    #[display("hard")]
    Hard,
    #[display("extreme")]
    Extreme,
}

impl SpeedDifficulty {
    pub const ALL: [Self; 4] = [Self::Easy, Self::Normal, Self::Hard, Self::Extreme];

    #[must_use]
    pub const fn speed_multiplier(self) -> f64 {
        match self {
            Self::Easy => 1.0,
            Self::Normal => 1.5,
            Self::Hard => 2.0,
            Self::Extreme => 3.0,
        }
    }
}

/// Score as much as possible before the clock runs out.
///
/// Gravity starts at the difficulty multiplier and accelerates with the
/// square of the elapsed fraction, reaching twice the multiplier at the end:
/// `m + m·(elapsed/limit)²`, applied on top of the classic level curve.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SpeedMode {
    time: TimeOption,
    difficulty: SpeedDifficulty,
}

impl SpeedMode {
    #[must_use]
    pub fn new(time: TimeOption, difficulty: SpeedDifficulty) -> Self {
        Self { time, difficulty }
    }

    #[must_use]
    pub fn time(&self) -> TimeOption {
        self.time
    }

    #[must_use]
    pub fn difficulty(&self) -> SpeedDifficulty {
        self.difficulty
    }
}

/// `m + m·(elapsed/limit)²`, or `m` when there is no limit.
#[must_use]
pub fn speed_factor(multiplier: f64, input: SpeedInput) -> f64 {
    let Some(limit) = input.time_limit.filter(|l| !l.is_zero()) else {
        return multiplier;
    };
    let ratio = (input.elapsed.as_secs_f64() / limit.as_secs_f64()).min(1.0);
    multiplier + multiplier * ratio * ratio
}

impl ModeStrategy for SpeedMode {
    fn config(&self) -> ModeConfig {
        let multiplier = self.difficulty.speed_multiplier();
        ModeConfig::new(GameMode::Speed)
            .with_score_multiplier(SPEED_SCORE_MULTIPLIER)
            .with_time_limit(self.time.duration())
            .with_speed_curve(
                SpeedCurve::classic().scaled_by(move |input| speed_factor(multiplier, input)),
            )
    }
}
