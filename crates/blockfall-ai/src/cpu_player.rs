use std::time::Duration;

use blockfall_engine::{ActionError, GameSession};
use log::{debug, trace};
use rand::{Rng as _, SeedableRng as _, seq::IndexedRandom as _};
use rand_pcg::Pcg32;

use crate::{TurnContext, TurnPlan, TurnPlanner, WeightSet, available_turns};

/// CPU opponent strength.
#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::FromStr,
)]
pub enum CpuDifficulty {
    #[default]
    #[display("easy")]
    Easy,
    #[display("normal")]
    Normal,
    #[display("hard")]
    Hard,
    #[display("expert")]
    Expert,
}

impl CpuDifficulty {
    pub const ALL: [Self; 4] = [Self::Easy, Self::Normal, Self::Hard, Self::Expert];

    #[must_use]
    pub const fn settings(self) -> CpuSettings {
        match self {
            Self::Easy => CpuSettings::new(1000, 0.3, 0.3),
            Self::Normal => CpuSettings::new(700, 0.15, 0.5),
            Self::Hard => CpuSettings::new(500, 0.05, 0.7),
            Self::Expert => CpuSettings::new(300, 0.01, 0.9),
        }
    }
}

/// Pace and quality of CPU play.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuSettings {
    /// Time between two placements.
    pub think_interval: Duration,
    /// Probability of playing a random placement instead of the best one.
    pub error_rate: f64,
    /// 0.0 plays for survival, 1.0 plays for line clears.
    pub attack_priority: f32,
}

impl CpuSettings {
    #[must_use]
    pub const fn new(think_ms: u64, error_rate: f64, attack_priority: f32) -> Self {
        Self {
            think_interval: Duration::from_millis(think_ms),
            error_rate,
            attack_priority,
        }
    }
}

/// Plays a [`GameSession`] one placement at a time.
///
/// [`Self::update`] is driven by the same monotonic clock as the session:
/// every `think_interval` the player plans a turn and applies all of its
/// inputs at once, so gravity never interferes with a planned placement.
#[derive(Debug, Clone)]
pub struct CpuPlayer {
    settings: CpuSettings,
    planner: TurnPlanner,
    rng: Pcg32,
    last_turn_at: Option<u64>,
}

impl CpuPlayer {
    #[must_use]
    pub fn new(settings: CpuSettings, seed: u64) -> Self {
        Self {
            planner: TurnPlanner::new(WeightSet::with_attack_priority(settings.attack_priority)),
            settings,
            rng: Pcg32::seed_from_u64(seed),
            last_turn_at: None,
        }
    }

    #[must_use]
    pub fn with_difficulty(difficulty: CpuDifficulty, seed: u64) -> Self {
        Self::new(difficulty.settings(), seed)
    }

    #[must_use]
    pub fn settings(&self) -> &CpuSettings {
        &self.settings
    }

    /// Plays a turn when the think interval has passed since the last one.
    ///
    /// The first call only starts the clock. Returns whether a turn was played.
    pub fn update(&mut self, session: &mut GameSession, now_ms: u64) -> bool {
        if !session.state().is_playing() {
            return false;
        }
        let Some(last) = self.last_turn_at else {
            self.last_turn_at = Some(now_ms);
            return false;
        };
        let think_ms = u64::try_from(self.settings.think_interval.as_millis()).unwrap_or(u64::MAX);
        if now_ms.saturating_sub(last) < think_ms {
            return false;
        }
        self.last_turn_at = Some(now_ms);
        self.play_turn(session).is_ok()
    }

    /// Chooses a turn for the current piece, occasionally a random one.
    pub fn plan_turn(&mut self, session: &GameSession) -> Option<TurnPlan> {
        let context = TurnContext::from_session(session)?;
        if self.rng.random_bool(self.settings.error_rate.clamp(0.0, 1.0)) {
            let turns = available_turns(&context).collect::<Vec<_>>();
            if let Some(turn) = turns.choose(&mut self.rng) {
                trace!("cpu misplays on purpose");
                return Some(turn.clone());
            }
        }
        self.planner.select_best_turn(&context)
    }

    /// Plans and immediately plays a turn.
    pub fn play_turn(&mut self, session: &mut GameSession) -> Result<(), ActionError> {
        let Some(plan) = self.plan_turn(session) else {
            return Err(ActionError::GameOver);
        };
        debug!(
            "cpu places {} at col {} rotation {}",
            plan.placement.kind(),
            plan.placement.col(),
            plan.placement.rotation().index()
        );
        for input in plan.inputs {
            if let Err(error) = session.apply(input) {
                debug!("cpu input {input:?} rejected: {error}");
                if session.active_piece().is_some() {
                    session.hard_drop()?;
                }
                return Err(error);
            }
        }
        Ok(())
    }
}
