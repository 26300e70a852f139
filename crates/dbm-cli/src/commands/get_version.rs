//! Get-version command.

use anyhow::{bail, Result};

use crate::cli::{GetVersionArgs, GlobalArgs};
use crate::commands::common::{build_version_manager, build_worker, load_config};

pub async fn execute(args: &GetVersionArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let Some(manager) = build_version_manager(&args.versioning, &config)? else {
        bail!("--no-versioning makes no sense here; a version manager is required");
    };
    let worker = build_worker(&args.connection, &config)?;

    let version = worker.get_version(manager.as_ref()).await?;
    println!("{version}");
    Ok(())
}
