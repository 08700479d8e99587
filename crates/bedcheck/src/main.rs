//! bedcheck - geofenced dormitory check-in server

use clap::Parser;
use color_eyre::eyre::Result;

use bedcheck::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(cmd) => cmd.run().await,
        Command::Roster(cmd) => cmd.run().await,
        Command::Report(cmd) => cmd.run().await,
        Command::Residents(cmd) => cmd.run().await,
        Command::Override(cmd) => cmd.run().await,
    }
}
