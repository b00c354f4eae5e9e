use std::path::PathBuf;

use blockfall_engine::{EndReason, GameMode, GameSession, ModeStrategy, PieceSeed};
use blockfall_modes::{
    AdventureMode, BattleMatch, BattleOutcome, BattleSettings, ClassicMode, Opponent, PuzzleMode,
    Side, SpeedDifficulty, SpeedMode, TimeOption, WinCondition, ZenMode,
};
use log::info;
use rand::Rng as _;

use crate::progress_file::ProgressFile;

/// Options selecting and configuring a game, shared by `play` and `simulate`.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GameArgs {
    /// Game mode: classic, speed, battle, puzzle, adventure or zen
    #[arg(long, default_value_t = GameMode::Classic)]
    pub mode: GameMode,
    /// Piece sequence seed as 32 hex digits (random if omitted)
    #[arg(long)]
    pub seed: Option<PieceSeed>,
    /// Starting level for classic mode
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub level: u32,
    /// Speed mode difficulty: easy, normal, hard or extreme
    #[arg(long, default_value_t = SpeedDifficulty::Normal)]
    pub difficulty: SpeedDifficulty,
    /// Speed mode time limit in seconds: 60, 120, 180 or 300
    #[arg(long, default_value_t = TimeOption::TwoMinutes)]
    pub time_limit: TimeOption,
    /// Adventure stage to play (the current stage if omitted)
    #[arg(long)]
    pub stage: Option<u32>,
    /// Puzzle to play, e.g. `pzl_2` (the current puzzle if omitted)
    #[arg(long)]
    pub puzzle: Option<String>,
    /// Battle opponent: local, cpu_easy, cpu_normal, cpu_hard or cpu_expert
    #[arg(long, default_value_t = Opponent::default())]
    pub opponent: Opponent,
    /// Battle win condition: knockout or score
    #[arg(long, default_value_t = WinCondition::Knockout)]
    pub win_condition: WinCondition,
    /// File keeping unlocked puzzles and adventure stages
    #[arg(long, default_value = "./data/progress.json")]
    pub progress_file: PathBuf,
}

impl Default for GameArgs {
    fn default() -> Self {
        Self {
            mode: GameMode::Classic,
            seed: None,
            level: 1,
            difficulty: SpeedDifficulty::Normal,
            time_limit: TimeOption::TwoMinutes,
            stage: None,
            puzzle: None,
            opponent: Opponent::default(),
            win_condition: WinCondition::Knockout,
            progress_file: PathBuf::from("./data/progress.json"),
        }
    }
}

impl GameArgs {
    /// The requested seed, or a fresh random one.
    pub(crate) fn seed(&self) -> PieceSeed {
        self.seed.unwrap_or_else(|| rand::rng().random())
    }

    /// Key of the personal best this setup competes for, e.g.
    /// `speed/120s/normal`. Battles, puzzles, adventure stages and zen keep none.
    pub(crate) fn best_score_key(&self) -> Option<String> {
        match self.mode {
            GameMode::Classic => Some(self.mode.to_string()),
            GameMode::Speed => Some(format!("speed/{}/{}", self.time_limit, self.difficulty)),
            GameMode::Battle | GameMode::Puzzle | GameMode::Adventure | GameMode::Zen => None,
        }
    }

    /// Builds the game. A requested puzzle or stage becomes the current
    /// selection in `progress` and must already be unlocked.
    pub(crate) fn start(&self, seed: PieceSeed, progress: &mut ProgressFile) -> anyhow::Result<Game> {
        let mut completion = None;
        let mode: Box<dyn ModeStrategy> = match self.mode {
            GameMode::Classic => Box::new(ClassicMode::new(self.level)),
            GameMode::Speed => Box::new(SpeedMode::new(self.time_limit, self.difficulty)),
            GameMode::Battle => {
                let settings = BattleSettings::default().with_win_condition(self.win_condition);
                let battle = BattleMatch::new(settings, self.opponent, seed)?;
                info!("battle seed {seed}");
                return Ok(Game::Battle(battle));
            }
            GameMode::Puzzle => {
                if let Some(id) = &self.puzzle {
                    progress.puzzle.select(id)?;
                }
                let puzzle = progress.puzzle.current();
                completion = Some(Completion::Puzzle(puzzle.id));
                Box::new(PuzzleMode::new(puzzle)?)
            }
            GameMode::Adventure => {
                if let Some(stage) = self.stage {
                    progress.adventure.select(stage)?;
                }
                let stage = progress.adventure.current();
                completion = Some(Completion::Stage(stage.number));
                Box::new(AdventureMode::new(stage))
            }
            GameMode::Zen => Box::new(ZenMode::default()),
        };
        let session = GameSession::new(mode, seed)?;
        info!("{} seed {seed}", self.mode);
        Ok(Game::Solo {
            session,
            completion,
        })
    }
}

/// What finishing a session with [`EndReason::Objective`] unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Completion {
    Puzzle(&'static str),
    Stage(u32),
}

/// A running game: one session, or a battle between two.
#[derive(Debug, derive_more::IsVariant)]
pub(crate) enum Game {
    Solo {
        session: GameSession,
        completion: Option<Completion>,
    },
    Battle(BattleMatch),
}

impl Game {
    pub(crate) fn tick(&mut self, now_ms: u64) {
        match self {
            Self::Solo { session, .. } => session.tick(now_ms),
            Self::Battle(battle) => _ = battle.tick(now_ms),
        }
    }

    /// The session controlled by the first player.
    pub(crate) fn player(&self) -> &GameSession {
        match self {
            Self::Solo { session, .. } => session,
            Self::Battle(battle) => battle.player(),
        }
    }

    pub(crate) fn player_mut(&mut self) -> &mut GameSession {
        match self {
            Self::Solo { session, .. } => session,
            Self::Battle(battle) => battle.player_mut(),
        }
    }

    /// The session controlled from the keyboard on `side`, if any.
    pub(crate) fn human_session_mut(&mut self, side: Side) -> Option<&mut GameSession> {
        match (self, side) {
            (Self::Solo { session, .. }, Side::Player) => Some(session),
            (Self::Solo { .. }, Side::Opponent) => None,
            (Self::Battle(battle), Side::Opponent) if battle.opponent() != Opponent::Local => None,
            (Self::Battle(battle), side) => Some(battle.session_mut(side)),
        }
    }

    pub(crate) fn battle(&self) -> Option<&BattleMatch> {
        match self {
            Self::Solo { .. } => None,
            Self::Battle(battle) => Some(battle),
        }
    }

    pub(crate) fn is_over(&self) -> bool {
        match self {
            Self::Solo { session, .. } => session.state().is_game_over(),
            Self::Battle(battle) => battle.is_over(),
        }
    }

    pub(crate) fn toggle_pause(&mut self) {
        // toggling an ended game does nothing
        _ = match self {
            Self::Solo { session, .. } => session.toggle_pause(),
            Self::Battle(battle) => battle.toggle_pause(),
        };
    }

    /// Ends the game on the player's request. A battle is conceded.
    pub(crate) fn quit(&mut self) {
        match self {
            Self::Solo { session, .. } => session.end(EndReason::Quit),
            Self::Battle(battle) => _ = battle.concede(Side::Player),
        }
    }

    /// Ends the game without a winner.
    pub(crate) fn stop(&mut self) {
        match self {
            Self::Solo { session, .. } => session.end(EndReason::Quit),
            Self::Battle(battle) => _ = battle.abandon(),
        }
    }

    pub(crate) fn outcome(&self) -> Option<BattleOutcome> {
        self.battle().and_then(BattleMatch::outcome)
    }

    /// Final score of a solo game that ended without the player quitting.
    pub(crate) fn finished_score(&self) -> Option<u64> {
        let Self::Solo { session, .. } = self else {
            return None;
        };
        session
            .final_stats()
            .filter(|stats| stats.reason != EndReason::Quit)
            .map(|stats| stats.score)
    }

    /// The unlock earned by this game, once it ended with its objective met.
    pub(crate) fn earned_completion(&self) -> Option<Completion> {
        match self {
            Self::Solo {
                session,
                completion,
            } if session.end_reason() == Some(EndReason::Objective) => *completion,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: PieceSeed = PieceSeed::from_bytes([7; 16]);

    fn args(mode: GameMode) -> GameArgs {
        GameArgs {
            mode,
            ..GameArgs::default()
        }
    }

    #[test]
    fn test_start_every_mode() {
        let mut progress = ProgressFile::default();
        for mode in GameMode::ALL {
            let game = args(mode).start(SEED, &mut progress).unwrap();
            assert_eq!(game.is_battle(), mode == GameMode::Battle);
            assert_eq!(game.player().config().game_mode, mode);
            assert!(!game.is_over());
        }
    }

    #[test]
    fn test_locked_puzzle_is_rejected() {
        let mut progress = ProgressFile::default();
        let args = GameArgs {
            puzzle: Some("pzl_2".into()),
            ..args(GameMode::Puzzle)
        };
        assert!(args.start(SEED, &mut progress).is_err());

        progress.puzzle.record_solved("pzl_1");
        let game = args.start(SEED, &mut progress).unwrap();
        assert!(matches!(
            game,
            Game::Solo {
                completion: Some(Completion::Puzzle("pzl_2")),
                ..
            }
        ));
    }

    #[test]
    fn test_solved_puzzle_earns_completion() {
        let mut progress = ProgressFile::default();
        let mut game = args(GameMode::Puzzle).start(SEED, &mut progress).unwrap();
        let session = game.player_mut();
        session.move_right().unwrap();
        session.move_right().unwrap();
        session.hard_drop().unwrap();
        assert!(game.is_over());
        assert_eq!(game.earned_completion(), Some(Completion::Puzzle("pzl_1")));
    }

    #[test]
    fn test_human_sessions() {
        let mut progress = ProgressFile::default();
        let mut solo = args(GameMode::Zen).start(SEED, &mut progress).unwrap();
        assert!(solo.human_session_mut(Side::Player).is_some());
        assert!(solo.human_session_mut(Side::Opponent).is_none());

        let mut cpu = args(GameMode::Battle).start(SEED, &mut progress).unwrap();
        assert!(cpu.human_session_mut(Side::Opponent).is_none());

        let local = GameArgs {
            opponent: Opponent::Local,
            ..args(GameMode::Battle)
        };
        let mut local = local.start(SEED, &mut progress).unwrap();
        assert!(local.human_session_mut(Side::Opponent).is_some());
    }

    #[test]
    fn test_best_score_keys() {
        assert_eq!(args(GameMode::Classic).best_score_key().as_deref(), Some("classic"));
        let speed = GameArgs {
            mode: GameMode::Speed,
            time_limit: TimeOption::OneMinute,
            difficulty: SpeedDifficulty::Extreme,
            ..GameArgs::default()
        };
        assert_eq!(speed.best_score_key().as_deref(), Some("speed/60s/extreme"));
        assert_eq!(args(GameMode::Battle).best_score_key(), None);
        assert_eq!(args(GameMode::Puzzle).best_score_key(), None);
        assert_eq!(args(GameMode::Zen).best_score_key(), None);
    }

    #[test]
    fn test_finished_score_ignores_quit() {
        let mut progress = ProgressFile::default();
        let mut quit = args(GameMode::Classic).start(SEED, &mut progress).unwrap();
        assert_eq!(quit.finished_score(), None);
        quit.quit();
        assert_eq!(quit.finished_score(), None);

        let speed = GameArgs {
            mode: GameMode::Speed,
            time_limit: TimeOption::OneMinute,
            ..GameArgs::default()
        };
        let mut timed = speed.start(SEED, &mut progress).unwrap();
        for now_ms in (0..=90_000).step_by(500) {
            timed.tick(now_ms);
            if timed.is_over() {
                break;
            }
        }
        assert!(timed.is_over());
        assert_eq!(timed.finished_score(), Some(timed.player().stats().score()));
    }

    #[test]
    fn test_quit_concedes_battle() {
        let mut progress = ProgressFile::default();
        let args = GameArgs {
            opponent: Opponent::Local,
            ..args(GameMode::Battle)
        };
        let mut game = args.start(SEED, &mut progress).unwrap();
        game.tick(0);
        game.quit();
        assert!(game.is_over());
        assert_eq!(game.outcome(), Some(BattleOutcome::Winner(Side::Opponent)));
        assert_eq!(game.earned_completion(), None);
    }
}
