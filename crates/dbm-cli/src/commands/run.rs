//! Run command: apply migration scripts to the target database.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use dbm_db::ScriptStatus;

use crate::cli::{GlobalArgs, RunArgs};
use crate::commands::common::{
    build_filter, build_version_manager, build_worker, load_config, parse_params, scripts_path,
    write_json_results, ExitCode, RunReportFile,
};

pub async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let start = Instant::now();
    let config = load_config(global)?;
    let path = scripts_path(args.path.as_deref(), &config);

    let filter = build_filter(&args.filter, &args.levels)?;
    let mut scripts = dbm_core::load_scripts(&path, filter.as_ref())?;
    if scripts.is_empty() {
        println!("Found no scripts.");
        return Ok(());
    }
    println!("Found {} script(s)", scripts.len());

    let params = parse_params(&args.params, &config)?;
    let manager = build_version_manager(&args.versioning, &config)?;
    let worker = build_worker(&args.connection, &config)?;
    if global.verbose {
        eprintln!(
            "[verbose] Running against {} / {}",
            worker.server(),
            worker.database().unwrap_or("<default>")
        );
    }

    let report = worker
        .execute_scripts(&mut scripts, &params, manager.as_deref())
        .await?;

    for result in &report.results {
        match result.status {
            ScriptStatus::Applied => {
                println!("  \u{2713} {} {}", result.version, result.path);
            }
            ScriptStatus::Skipped => {
                println!("  - {} {} (already applied)", result.version, result.path);
            }
            ScriptStatus::Failed => {
                println!(
                    "  \u{2717} {} {} - {}",
                    result.version,
                    result.path,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }
    println!(
        "Applied {} script(s), skipped {}, of {} [{}ms]",
        report.applied,
        report.skipped,
        scripts.len(),
        start.elapsed().as_millis()
    );

    if let Some(report_path) = &args.report {
        write_json_results(
            Path::new(report_path),
            &RunReportFile {
                timestamp: Utc::now(),
                elapsed_secs: start.elapsed().as_secs_f64(),
                applied: report.applied,
                skipped: report.skipped,
                success: report.succeeded(),
                results: &report.results,
            },
        )?;
    }

    if !report.succeeded() {
        return Err(ExitCode(1).into());
    }
    Ok(())
}
