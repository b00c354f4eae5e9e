use anyhow::bail;
use blockfall_ai::{CpuDifficulty, CpuPlayer};
use blockfall_engine::{FinalStats, GameMode, GameSession, PieceSeed, ScoreSubmission};
use blockfall_modes::Opponent;
use log::info;
use serde::Serialize;

use crate::{
    game::{Game, GameArgs},
    progress_file::ProgressFile,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    #[command(flatten)]
    game: GameArgs,
    /// Strength of the CPU playing the session
    #[arg(long, default_value_t = CpuDifficulty::Expert)]
    cpu: CpuDifficulty,
    /// Stop after this many pieces have locked
    #[arg(long)]
    max_pieces: Option<usize>,
    /// Stop after this much simulated play time, in seconds
    #[arg(long, default_value_t = 3600)]
    max_seconds: u64,
    /// Clock step of the simulation, in milliseconds
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..))]
    step_ms: u64,
}

/// When a simulation gives up on a game that has not ended by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Limits {
    pub step_ms: u64,
    pub max_pieces: Option<usize>,
    pub max_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SideReport {
    pub stats: FinalStats,
    pub submission: ScoreSubmission,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
}

impl SideReport {
    fn from_session(session: &GameSession) -> Option<Self> {
        let stats = session.final_stats()?;
        Some(Self {
            submission: stats.score_submission(),
            stats,
            progress: session.mode().progress(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SimulationReport {
    pub seed: PieceSeed,
    pub player: SideReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent: Option<SideReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        game: game_args,
        cpu,
        max_pieces,
        max_seconds,
        step_ms,
    } = arg;
    if game_args.mode == GameMode::Battle && game_args.opponent == Opponent::Local {
        bail!("simulating a battle needs a CPU opponent");
    }

    let mut progress = ProgressFile::load(&game_args.progress_file)?;
    let seed = game_args.seed();
    let mut game = game_args.start(seed, &mut progress)?;
    let limits = Limits {
        step_ms: *step_ms,
        max_pieces: *max_pieces,
        max_ms: max_seconds.saturating_mul(1000),
    };
    let report = simulate(&mut game, seed, *cpu, limits)?;

    if let Some(completion) = game.earned_completion() {
        progress.record(completion);
        progress.save(&game_args.progress_file)?;
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Plays `game` to the end with a CPU on the player's side and a fixed
/// timestep clock starting at zero.
pub(crate) fn simulate(
    game: &mut Game,
    seed: PieceSeed,
    cpu: CpuDifficulty,
    limits: Limits,
) -> anyhow::Result<SimulationReport> {
    let mut player = CpuPlayer::with_difficulty(cpu, cpu_seed(seed));
    let mut now = 0;
    loop {
        game.tick(now);
        if game.is_over() {
            break;
        }
        player.update(game.player_mut(), now);

        let pieces = game.player().stats().pieces_locked();
        if limits.max_pieces.is_some_and(|max| pieces >= max) || now >= limits.max_ms {
            info!("simulation stopped at {now} ms after {pieces} pieces");
            game.stop();
            break;
        }
        now += limits.step_ms;
    }

    let Some(player) = SideReport::from_session(game.player()) else {
        bail!("session did not end");
    };
    let opponent = game
        .battle()
        .and_then(|battle| SideReport::from_session(battle.rival()));
    Ok(SimulationReport {
        seed,
        player,
        opponent,
        outcome: game.outcome().map(|outcome| outcome.to_string()),
    })
}

#[expect(clippy::cast_possible_truncation)]
fn cpu_seed(seed: PieceSeed) -> u64 {
    u128::from_be_bytes(seed.to_bytes()) as u64
}
