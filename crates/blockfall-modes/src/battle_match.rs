use blockfall_ai::CpuPlayer;
use blockfall_engine::{ActionError, ConfigError, EndReason, GameSession, PieceSeed};
use log::{debug, info};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

use crate::{BattleRules, BattleSettings, Opponent, WinCondition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum Side {
    #[display("player")]
    Player,
    #[display("opponent")]
    Opponent,
}

impl Side {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Player => Self::Opponent,
            Self::Opponent => Self::Player,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum BattleOutcome {
    #[display("{_0} wins")]
    Winner(Side),
    #[display("draw")]
    Draw,
}

/// Two battle sessions played against each other.
///
/// [`Self::tick`] advances both sessions with the same clock, lets a CPU
/// opponent think, carries garbage across and decides the match. Garbage
/// rows sent by one side rise on the other after its next lock, with a
/// random hole column per attack.
///
/// The match ends when either session is over. Under
/// [`WinCondition::Knockout`] the side still standing wins; under
/// [`WinCondition::Score`] the higher score wins. The session still playing
/// at that point is ended with [`EndReason::Objective`] if it won and
/// [`EndReason::Defeated`] if it lost.
#[derive(Debug)]
pub struct BattleMatch {
    settings: BattleSettings,
    opponent: Opponent,
    player: GameSession,
    rival: GameSession,
    cpu: Option<CpuPlayer>,
    rng: Pcg32,
    outcome: Option<BattleOutcome>,
}

impl BattleMatch {
    /// Starts a match where both sides receive the same piece sequence.
    pub fn new(
        settings: BattleSettings,
        opponent: Opponent,
        seed: PieceSeed,
    ) -> Result<Self, ConfigError> {
        let player = GameSession::new(Box::new(BattleRules::new(settings)), seed)?;
        let rival = GameSession::new(Box::new(BattleRules::new(settings)), seed)?;
        Ok(Self::with_sessions(settings, opponent, player, rival, seed))
    }

    /// Starts a match from sessions built by the caller, such as sessions
    /// with custom boards. Both should run [`BattleRules`] to send garbage.
    #[must_use]
    pub fn with_sessions(
        settings: BattleSettings,
        opponent: Opponent,
        player: GameSession,
        rival: GameSession,
        seed: PieceSeed,
    ) -> Self {
        let mut rng = Pcg32::from_seed(seed.to_bytes());
        let cpu = match opponent {
            Opponent::Cpu(difficulty) => Some(CpuPlayer::with_difficulty(difficulty, rng.random())),
            Opponent::Local => None,
        };
        let mut battle = Self {
            settings,
            opponent,
            player,
            rival,
            cpu,
            rng,
            outcome: None,
        };
        if settings.starting_garbage > 0 {
            let hole_col = battle.hole_col();
            battle.player.receive_garbage(settings.starting_garbage, hole_col);
            battle.rival.receive_garbage(settings.starting_garbage, hole_col);
        }
        info!("battle against {opponent} ({})", settings.win_condition);
        battle
    }

    #[must_use]
    pub fn settings(&self) -> &BattleSettings {
        &self.settings
    }

    #[must_use]
    pub fn opponent(&self) -> Opponent {
        self.opponent
    }

    #[must_use]
    pub fn session(&self, side: Side) -> &GameSession {
        match side {
            Side::Player => &self.player,
            Side::Opponent => &self.rival,
        }
    }

    /// Mutable access for player input. A CPU-controlled side should be left
    /// to the CPU.
    pub fn session_mut(&mut self, side: Side) -> &mut GameSession {
        match side {
            Side::Player => &mut self.player,
            Side::Opponent => &mut self.rival,
        }
    }

    #[must_use]
    pub fn player(&self) -> &GameSession {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut GameSession {
        &mut self.player
    }

    #[must_use]
    pub fn rival(&self) -> &GameSession {
        &self.rival
    }

    #[must_use]
    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Advances the match to `now_ms`. Returns the outcome once decided.
    pub fn tick(&mut self, now_ms: u64) -> Option<BattleOutcome> {
        if self.outcome.is_some() {
            return self.outcome;
        }
        self.player.tick(now_ms);
        self.rival.tick(now_ms);
        if let Some(cpu) = &mut self.cpu {
            cpu.update(&mut self.rival, now_ms);
        }
        self.exchange_garbage();
        self.decide()
    }

    /// Pauses both sessions.
    pub fn pause(&mut self) -> Result<(), ActionError> {
        self.player.pause()?;
        self.rival.pause()
    }

    /// Resumes both sessions.
    pub fn resume(&mut self) -> Result<(), ActionError> {
        self.player.resume()?;
        self.rival.resume()
    }

    pub fn toggle_pause(&mut self) -> Result<(), ActionError> {
        if self.player.state().is_paused() {
            self.resume()
        } else {
            self.pause()
        }
    }

    /// Moves garbage queued by each side's line clears to the other side.
    pub fn exchange_garbage(&mut self) {
        let to_rival = self.player.take_outgoing_garbage();
        if to_rival > 0 {
            let hole_col = self.hole_col();
            debug!("player attacks with {to_rival} line(s)");
            self.rival.receive_garbage(to_rival, hole_col);
        }
        let to_player = self.rival.take_outgoing_garbage();
        if to_player > 0 {
            let hole_col = self.hole_col();
            debug!("opponent attacks with {to_player} line(s)");
            self.player.receive_garbage(to_player, hole_col);
        }
    }

    fn hole_col(&mut self) -> usize {
        self.rng.random_range(0..self.player.board().cols())
    }

    fn decide(&mut self) -> Option<BattleOutcome> {
        let player_over = self.player.state().is_game_over();
        let rival_over = self.rival.state().is_game_over();
        if !player_over && !rival_over {
            return None;
        }
        let outcome = match self.settings.win_condition {
            WinCondition::Knockout => match (player_over, rival_over) {
                (true, true) => BattleOutcome::Draw,
                (true, false) => BattleOutcome::Winner(Side::Opponent),
                _ => BattleOutcome::Winner(Side::Player),
            },
            WinCondition::Score => {
                let player_score = self.player.stats().score();
                let rival_score = self.rival.stats().score();
                match player_score.cmp(&rival_score) {
                    std::cmp::Ordering::Greater => BattleOutcome::Winner(Side::Player),
                    std::cmp::Ordering::Less => BattleOutcome::Winner(Side::Opponent),
                    std::cmp::Ordering::Equal => BattleOutcome::Draw,
                }
            }
        };
        Some(self.conclude(outcome, EndReason::Defeated))
    }

    /// Ends the match with `side` giving up. The other side wins.
    pub fn concede(&mut self, side: Side) -> BattleOutcome {
        if let Some(outcome) = self.outcome {
            return outcome;
        }
        self.session_mut(side).end(EndReason::Quit);
        self.conclude(BattleOutcome::Winner(side.other()), EndReason::Quit)
    }

    /// Stops an undecided match as a draw.
    pub fn abandon(&mut self) -> BattleOutcome {
        if let Some(outcome) = self.outcome {
            return outcome;
        }
        self.conclude(BattleOutcome::Draw, EndReason::Quit)
    }

    /// Ends both sessions according to `outcome`. Sessions that are already
    /// over keep their end reason.
    fn conclude(&mut self, outcome: BattleOutcome, loser_reason: EndReason) -> BattleOutcome {
        for side in [Side::Player, Side::Opponent] {
            let reason = match outcome {
                BattleOutcome::Winner(winner) if winner == side => EndReason::Objective,
                BattleOutcome::Winner(_) => loser_reason,
                BattleOutcome::Draw => EndReason::Quit,
            };
            self.session_mut(side).end(reason);
        }
        info!("battle over: {outcome}");
        self.outcome = Some(outcome);
        outcome
    }
}
