//! dbmigrate CLI - versioned SQL migration runner for PostgreSQL

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{create_db, drop_db, get_version, run, scan, set_version};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        cli::Commands::Scan(args) => scan::execute(args, &cli.global).await,
        cli::Commands::Run(args) => run::execute(args, &cli.global).await,
        cli::Commands::CreateDb(args) => create_db::execute(args, &cli.global).await,
        cli::Commands::DropDb(args) => drop_db::execute(args, &cli.global).await,
        cli::Commands::GetVersion(args) => get_version::execute(args, &cli.global).await,
        cli::Commands::SetVersion(args) => set_version::execute(args, &cli.global).await,
    }
}
