use log::info;

use crate::{
    command::play::app::PlayApp,
    game::{Game, GameArgs},
    progress_file::ProgressFile,
    tui::Tui,
};

mod app;
mod keys;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    #[command(flatten)]
    game: GameArgs,
    /// Hide the landing position of the falling piece
    #[arg(long)]
    no_ghost: bool,
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg {
        game: game_args,
        no_ghost,
    } = arg;

    let mut progress = ProgressFile::load(&game_args.progress_file)?;
    let seed = game_args.seed();
    let game = game_args.start(seed, &mut progress)?;

    let mut app = PlayApp::new(game, !no_ghost);
    Tui::new().run(&mut app)?;
    let game = app.into_game();

    if let Some(completion) = game.earned_completion()
        && progress.record(completion)
    {
        info!("unlocked new content: {completion:?}");
    }
    let new_best = match (game_args.best_score_key(), game.finished_score()) {
        (Some(key), Some(score)) => progress.record_score(&key, score),
        _ => false,
    };
    progress.save(&game_args.progress_file)?;

    print_summary(&game, new_best);
    Ok(())
}

fn print_summary(game: &Game, new_best: bool) {
    if let Some(outcome) = game.outcome() {
        println!("battle: {outcome}");
    }
    if let Some(stats) = game.player().final_stats() {
        println!(
            "{}: score {}, level {}, {} lines, {} pieces ({})",
            stats.game_mode, stats.score, stats.level, stats.lines, stats.pieces, stats.reason
        );
    }
    if new_best {
        println!("new personal best!");
    }
}
