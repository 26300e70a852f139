//! Create-db command.

use anyhow::Result;
use dbm_core::PARAM_DB_NAME;

use crate::cli::{CreateDbArgs, GlobalArgs};
use crate::commands::common::{
    build_version_manager, build_worker, load_config, parse_params, ExitCode,
};

pub async fn execute(args: &CreateDbArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let params = parse_params(&args.params, &config)?;
    let manager = build_version_manager(&args.versioning, &config)?;
    let mut worker = build_worker(&args.connection, &config)?;

    let name = args
        .name
        .clone()
        .or_else(|| worker.database().map(str::to_string))
        .or_else(|| params.value_of(PARAM_DB_NAME).map(str::to_string));
    if global.verbose {
        eprintln!(
            "[verbose] Creating database {} on {}",
            name.as_deref().unwrap_or("<unnamed>"),
            worker.server()
        );
    }

    if worker
        .create_database(name.as_deref(), &params, manager.as_deref())
        .await
    {
        println!("Database created.");
        Ok(())
    } else {
        eprintln!("Failed to create database.");
        Err(ExitCode(1).into())
    }
}
