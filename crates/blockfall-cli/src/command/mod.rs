use std::{fs::File, path::PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use env_logger::{Env, Target};

use self::{play::PlayArg, simulate::SimulateArg};

mod play;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Append log records to this file (`play` logs nothing without it)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play in the terminal
    Play(#[clap(flatten)] PlayArg),
    /// Let the CPU play a game headless and print its final statistics
    Simulate(#[clap(flatten)] SimulateArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    let mode = args.mode.unwrap_or(Mode::Play(PlayArg::default()));
    init_logger(args.log_file.as_ref(), matches!(mode, Mode::Play(_)))?;
    match mode {
        Mode::Play(arg) => play::run(&arg)?,
        Mode::Simulate(arg) => simulate::run(&arg)?,
    }
    Ok(())
}

/// Standard error belongs to the terminal UI while playing, so `play` only
/// logs to a file.
fn init_logger(log_file: Option<&PathBuf>, is_tui: bool) -> anyhow::Result<()> {
    let default_filter = if log_file.is_some() { "info" } else { "warn" };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_filter));
    match log_file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            builder.target(Target::Pipe(Box::new(file)));
        }
        None if is_tui => return Ok(()),
        None => {}
    }
    builder.init();
    Ok(())
}
