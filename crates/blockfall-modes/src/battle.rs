use std::{fmt, str::FromStr, time::Duration};

use blockfall_ai::CpuDifficulty;
use blockfall_engine::{
    GameMode, LineClear, ModeConfig, ModeControl, ModeStrategy, SpeedCurve, is_tetris,
};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::OptionError;

/// How a battle is decided.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
pub enum WinCondition {
    /// The last player standing wins.
    #[default]
    #[display("knockout")]
    Knockout,
    /// The higher score when the game time runs out wins.
    #[display("score")]
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattleSettings {
    pub win_condition: WinCondition,
    /// Round length, used with [`WinCondition::Score`].
    pub game_time: Duration,
    /// Multiplier applied to garbage before flooring.
    pub attack_power: f64,
    /// Garbage rows each player starts with.
    pub starting_garbage: usize,
}

impl Default for BattleSettings {
    fn default() -> Self {
        Self {
            win_condition: WinCondition::Knockout,
            game_time: Duration::from_secs(180),
            attack_power: 1.0,
            starting_garbage: 0,
        }
    }
}

impl BattleSettings {
    #[must_use]
    pub fn with_win_condition(self, win_condition: WinCondition) -> Self {
        Self {
            win_condition,
            ..self
        }
    }

    #[must_use]
    pub fn with_game_time(self, game_time: Duration) -> Self {
        Self { game_time, ..self }
    }

    #[must_use]
    pub fn with_attack_power(self, attack_power: f64) -> Self {
        Self {
            attack_power,
            ..self
        }
    }

    #[must_use]
    pub fn with_starting_garbage(self, starting_garbage: usize) -> Self {
        Self {
            starting_garbage,
            ..self
        }
    }
}

/// Garbage rows sent for a single clear: 2 → 1, 3 → 2, Tetris → 4, scaled
/// by `attack_power` and floored. Singles send nothing.
#[must_use]
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn garbage_lines(lines: usize, attack_power: f64) -> usize {
    let base: u32 = match lines {
        _ if is_tetris(lines) => 4,
        3 => 2,
        2 => 1,
        _ => 0,
    };
    let scaled = (f64::from(base) * attack_power).floor();
    if scaled.is_finite() && scaled > 0.0 {
        scaled as usize
    } else {
        0
    }
}

/// `1 + (level − 1)·0.1`.
#[must_use]
pub fn battle_speed_factor(level: u32) -> f64 {
    1.0 + f64::from(level.saturating_sub(1)) * 0.1
}

/// Rules for one side of a battle. Line clears are turned into garbage
/// for the opponent; [`crate::BattleMatch`] carries it across.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattleRules {
    settings: BattleSettings,
    garbage_sent: usize,
}

impl BattleRules {
    #[must_use]
    pub fn new(settings: BattleSettings) -> Self {
        Self {
            settings,
            garbage_sent: 0,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &BattleSettings {
        &self.settings
    }
}

impl ModeStrategy for BattleRules {
    fn config(&self) -> ModeConfig {
        let config = ModeConfig::new(GameMode::Battle).with_speed_curve(
            SpeedCurve::from_speed_factor(Duration::from_secs(1), |input| {
                battle_speed_factor(input.level)
            }),
        );
        match self.settings.win_condition {
            WinCondition::Knockout => config,
            WinCondition::Score => config.with_time_limit(self.settings.game_time),
        }
    }

    fn on_line_cleared(&mut self, clear: &LineClear, control: &mut ModeControl) {
        let garbage = garbage_lines(clear.lines, self.settings.attack_power);
        if garbage > 0 {
            debug!("{} line clear sends {garbage} garbage", clear.lines);
            self.garbage_sent += garbage;
            control.send_garbage(garbage);
        }
    }

    fn progress(&self) -> Option<String> {
        Some(format!("{} garbage sent", self.garbage_sent))
    }
}

/// Who plays the other side of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opponent {
    Cpu(CpuDifficulty),
    /// A second player on the same terminal.
    Local,
}

impl Default for Opponent {
    fn default() -> Self {
        Self::Cpu(CpuDifficulty::Easy)
    }
}

impl FromStr for Opponent {
    type Err = OptionError;

    /// Accepts `local`, `cpu_<difficulty>` or a bare difficulty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if name == "local" {
            return Ok(Self::Local);
        }
        let difficulty = name.strip_prefix("cpu_").unwrap_or(&name);
        difficulty
            .parse()
            .map(Self::Cpu)
            .map_err(|_| OptionError::UnknownOpponent {
                name: s.to_owned(),
            })
    }
}

impl fmt::Display for Opponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu(difficulty) => write!(f, "cpu_{difficulty}"),
            Self::Local => f.write_str("local"),
        }
    }
}

#[cfg(test)]
mod tests {
    use blockfall_engine::{Board, GameSession, PieceKind, PieceSeed, SpeedInput};

    use super::*;

    #[test]
    fn test_garbage_table() {
        let cases = [(0, 0), (1, 0), (2, 1), (3, 2), (4, 4)];
        for (lines, garbage) in cases {
            assert_eq!(garbage_lines(lines, 1.0), garbage, "{lines} lines");
        }
    }

    #[test]
    fn test_attack_power_is_floored() {
        assert_eq!(garbage_lines(4, 1.5), 6);
        assert_eq!(garbage_lines(2, 1.5), 1);
        assert_eq!(garbage_lines(3, 0.4), 0);
        assert_eq!(garbage_lines(4, -1.0), 0);
        assert_eq!(garbage_lines(4, f64::NAN), 0);
    }

    #[test]
    fn test_battle_speed_curve() {
        let curve = BattleRules::new(BattleSettings::default()).config().speed_curve;
        let at = |level| SpeedInput {
            level,
            elapsed: Duration::ZERO,
            time_limit: None,
        };
        assert_eq!(curve.interval(at(1)), Duration::from_secs(1));
        assert_eq!(curve.interval(at(11)), Duration::from_millis(500));
    }

    #[test]
    fn test_score_condition_sets_time_limit() {
        let knockout = BattleRules::new(BattleSettings::default()).config();
        assert!(knockout.time_limit.is_none());

        let settings = BattleSettings::default()
            .with_win_condition(WinCondition::Score)
            .with_game_time(Duration::from_secs(90));
        let score = BattleRules::new(settings).config();
        assert_eq!(score.time_limit, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_clears_queue_outgoing_garbage() {
        #[derive(Debug)]
        struct TetrisReady(BattleRules);

        impl ModeStrategy for TetrisReady {
            fn config(&self) -> ModeConfig {
                let mut rows = vec![".........."; 16];
                rows.extend(["#########."; 4]);
                self.0
                    .config()
                    .with_bag(vec![PieceKind::I])
                    .with_initial_board(Board::from_rows(rows).unwrap())
            }

            fn on_line_cleared(&mut self, clear: &LineClear, control: &mut ModeControl) {
                self.0.on_line_cleared(clear, control);
            }
        }

        let mode = TetrisReady(BattleRules::new(BattleSettings::default()));
        let mut session = GameSession::new(Box::new(mode), PieceSeed::from_bytes([2; 16])).unwrap();
        session.rotate_cw().unwrap();
        for _ in 0..3 {
            session.move_right().unwrap();
        }
        session.hard_drop().unwrap();
        assert_eq!(session.stats().tetrises(), 1);
        assert_eq!(session.take_outgoing_garbage(), 4);
        assert_eq!(session.take_outgoing_garbage(), 0);
    }

    #[test]
    fn test_opponent_parsing() {
        assert_eq!(
            "cpu_hard".parse::<Opponent>().unwrap(),
            Opponent::Cpu(CpuDifficulty::Hard)
        );
        assert_eq!(
            "expert".parse::<Opponent>().unwrap(),
            Opponent::Cpu(CpuDifficulty::Expert)
        );
        assert_eq!("Local".parse::<Opponent>().unwrap(), Opponent::Local);
        assert_eq!(
            "online".parse::<Opponent>(),
            Err(OptionError::UnknownOpponent {
                name: "online".to_owned()
            })
        );
        assert_eq!(Opponent::Cpu(CpuDifficulty::Normal).to_string(), "cpu_normal");
        assert_eq!(Opponent::default().to_string(), "cpu_easy");
    }

    #[test]
    fn test_win_condition_parsing() {
        assert_eq!("score".parse::<WinCondition>().unwrap(), WinCondition::Score);
        assert_eq!(WinCondition::default().to_string(), "knockout");
    }
}
