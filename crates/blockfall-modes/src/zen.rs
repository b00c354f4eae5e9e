use std::time::Duration;

use blockfall_engine::{GameMode, LineClear, ModeConfig, ModeControl, ModeStrategy, SpeedCurve};

const ZEN_SPEED_FACTOR: f64 = 0.8;

/// Relaxed endless play: slower gravity, the level never rises and a
/// top-out clears the board instead of ending the session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ZenMode {
    total_lines: usize,
}

impl ModeStrategy for ZenMode {
    fn config(&self) -> ModeConfig {
        ModeConfig::new(GameMode::Zen)
            .with_speed_curve(SpeedCurve::from_speed_factor(
                Duration::from_secs(1),
                |_| ZEN_SPEED_FACTOR,
            ))
            .with_level_progression(false)
            .with_suppress_top_out_game_over(true)
    }

    fn on_line_cleared(&mut self, clear: &LineClear, _control: &mut ModeControl) {
        self.total_lines = clear.total_lines;
    }

    fn progress(&self) -> Option<String> {
        Some(format!("{} lines", self.total_lines))
    }
}
