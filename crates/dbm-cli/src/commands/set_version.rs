//! Set-version command.

use anyhow::{bail, Context, Result};
use dbm_core::Version;

use crate::cli::{GlobalArgs, SetVersionArgs};
use crate::commands::common::{build_version_manager, build_worker, load_config};

pub async fn execute(args: &SetVersionArgs, global: &GlobalArgs) -> Result<()> {
    let version = Version::parse(&args.version)
        .with_context(|| format!("'{}' is not a valid version", args.version))?;

    let config = load_config(global)?;
    let Some(manager) = build_version_manager(&args.versioning, &config)? else {
        bail!("--no-versioning makes no sense here; a version manager is required");
    };
    let worker = build_worker(&args.connection, &config)?;

    worker.set_version(manager.as_ref(), &version).await?;
    println!("Database version set to {version}");
    Ok(())
}
