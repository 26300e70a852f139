//! Drop-db command.

use anyhow::{Context, Result};
use dbm_core::PARAM_DB_NAME;

use crate::cli::{DropDbArgs, GlobalArgs};
use crate::commands::common::{build_worker, load_config, parse_params, ExitCode};

pub async fn execute(args: &DropDbArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let params = parse_params(&args.params, &config)?;
    let worker = build_worker(&args.connection, &config)?;

    let name = args
        .name
        .clone()
        .or_else(|| worker.database().map(str::to_string))
        .or_else(|| params.value_of(PARAM_DB_NAME).map(str::to_string))
        .context("No database to drop; use --name, --database, or a DbName parameter")?;
    if global.verbose {
        eprintln!("[verbose] Dropping database {} on {}", name, worker.server());
    }

    if worker.drop_database(&name, !args.keep_connections).await {
        println!("Database {name} dropped.");
        Ok(())
    } else {
        eprintln!("Failed to drop database {name}.");
        Err(ExitCode(1).into())
    }
}
