use std::time::Duration;

use blockfall_engine::{
    EndReason, GameMode, LineClear, ModeConfig, ModeControl, ModeStrategy, SpeedCurve,
};
use log::info;

const ADVENTURE_SCORE_MULTIPLIER: f64 = 1.2;

/// What clears an adventure stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageGoal {
    /// Clear this many lines in total.
    Lines(usize),
    /// Stay alive until the time limit runs out.
    Survive(Duration),
    /// Score this many Tetrises.
    Tetrises(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    /// 1-based stage number.
    pub number: u32,
    pub title: &'static str,
    pub objective: &'static str,
    pub level: u32,
    pub goal: StageGoal,
}

pub static STAGES: [Stage; 3] = [
    Stage {
        number: 1,
        title: "The Journey Begins",
        objective: "Clear 10 lines",
        level: 1,
        goal: StageGoal::Lines(10),
    },
    Stage {
        number: 2,
        title: "Race Against Time",
        objective: "Survive for 60 seconds",
        level: 2,
        goal: StageGoal::Survive(Duration::from_secs(60)),
    },
    Stage {
        number: 3,
        title: "Tetris Master",
        objective: "Score 2 Tetrises",
        level: 2,
        goal: StageGoal::Tetrises(2),
    },
];

/// Looks up a stage by its 1-based number.
#[must_use]
pub fn find_stage(number: u32) -> Option<&'static Stage> {
    let index = usize::try_from(number.checked_sub(1)?).ok()?;
    STAGES.get(index)
}

/// `1 + (level − 1)·0.15`.
#[must_use]
pub fn adventure_speed_factor(level: u32) -> f64 {
    1.0 + f64::from(level.saturating_sub(1)) * 0.15
}

/// Plays one adventure [`Stage`]. Reaching the goal finishes the session with
/// [`EndReason::Objective`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdventureMode {
    stage: &'static Stage,
    total_lines: usize,
    tetrises: usize,
    remaining: Option<Duration>,
}

impl AdventureMode {
    #[must_use]
    pub fn new(stage: &'static Stage) -> Self {
        Self {
            stage,
            total_lines: 0,
            tetrises: 0,
            remaining: None,
        }
    }

    #[must_use]
    pub fn stage(&self) -> &'static Stage {
        self.stage
    }
}

impl ModeStrategy for AdventureMode {
    fn config(&self) -> ModeConfig {
        let config = ModeConfig::new(GameMode::Adventure)
            .with_starting_level(self.stage.level)
            .with_score_multiplier(ADVENTURE_SCORE_MULTIPLIER)
            .with_speed_curve(SpeedCurve::from_speed_factor(
                Duration::from_secs(1),
                |input| adventure_speed_factor(input.level),
            ));
        match self.stage.goal {
            StageGoal::Survive(limit) => config.with_time_limit(limit),
            StageGoal::Lines(_) | StageGoal::Tetrises(_) => config,
        }
    }

    fn on_game_start(&mut self, _control: &mut ModeControl) {
        self.total_lines = 0;
        self.tetrises = 0;
        self.remaining = None;
        info!("stage {}: {}", self.stage.number, self.stage.title);
    }

    fn on_line_cleared(&mut self, clear: &LineClear, control: &mut ModeControl) {
        self.total_lines = clear.total_lines;
        if clear.is_tetris {
            self.tetrises += 1;
        }
        let cleared = match self.stage.goal {
            StageGoal::Lines(target) => self.total_lines >= target,
            StageGoal::Tetrises(target) => self.tetrises >= target,
            StageGoal::Survive(_) => false,
        };
        if cleared {
            info!("stage {} cleared", self.stage.number);
            control.finish(EndReason::Objective);
        }
    }

    fn on_timer_tick(&mut self, remaining: Duration, _elapsed: Duration, control: &mut ModeControl) {
        self.remaining = Some(remaining);
        if matches!(self.stage.goal, StageGoal::Survive(_)) && remaining.is_zero() {
            info!("stage {} survived", self.stage.number);
            control.finish(EndReason::Objective);
        }
    }

    fn progress(&self) -> Option<String> {
        let progress = match self.stage.goal {
            StageGoal::Lines(target) => format!("{}/{target} lines", self.total_lines),
            StageGoal::Tetrises(target) => format!("{}/{target} tetrises", self.tetrises),
            StageGoal::Survive(limit) => {
                let remaining = self.remaining.unwrap_or(limit);
                format!("survive {}s", remaining.as_secs())
            }
        };
        Some(format!("stage {}: {progress}", self.stage.number))
    }
}
