mod command;
mod game;
mod progress_file;
mod tui;
mod ui;

fn main() -> anyhow::Result<()> {
    command::run()
}
