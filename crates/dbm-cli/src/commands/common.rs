//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dbm_core::{
    AcceptAll, Config, FnFilter, LevelFilter, RegexFilter, ScriptFilter, ScriptParams, Version,
};
use dbm_db::{ExistingTableVersioning, PgWorker, ScriptResult, SettingsVersioning, VersionManager};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cli::{ConnectionArgs, GlobalArgs, VersioningArgs};

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Intentionally empty: ExitCode is a control-flow mechanism, not a
        // user-facing error.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Load the project config from `--config`, or `./dbmigrate.yml` when
/// present, or defaults.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    match &global.config {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("Failed to load config '{path}'")),
        None => Config::load_from_dir(Path::new(".")).context("Failed to load config"),
    }
}

/// Scripts path from the positional argument, falling back to the config.
pub(crate) fn scripts_path(arg: Option<&str>, config: &Config) -> PathBuf {
    PathBuf::from(arg.unwrap_or(&config.scripts))
}

/// Build the migration worker from connection flags and config, flags first.
pub(crate) fn build_worker(connection: &ConnectionArgs, config: &Config) -> Result<PgWorker> {
    if let Some(text) = connection
        .connection_string
        .as_deref()
        .or(config.connection_string.as_deref())
    {
        return PgWorker::from_connection_string(text).context("Invalid connection string");
    }

    let server = connection
        .server
        .as_deref()
        .or(config.server.as_deref())
        .context("No server given; use --server or --connection-string")?;
    let database = connection.database.as_deref().or(config.database.as_deref());
    let user = connection.user.as_deref().or(config.user.as_deref()).unwrap_or("");
    let password = connection
        .password
        .as_deref()
        .or(config.password.as_deref())
        .unwrap_or("");

    Ok(PgWorker::new(server, database, user, password))
}

/// Parse repeatable `Name=Value` parameter flags, then append config-file
/// params that were not overridden on the command line.
pub(crate) fn parse_params(pairs: &[String], config: &Config) -> Result<ScriptParams> {
    let mut params = ScriptParams::new();
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .with_context(|| format!("Invalid --param '{pair}', expected Name=Value"))?;
        params.push(name.trim(), value);
    }
    for (name, value) in &config.params {
        if params.find(name).is_none() {
            params.push(name.clone(), value.clone());
        }
    }
    Ok(params)
}

/// Build the scanner filter from `--filter` patterns and `--levels`.
///
/// With both given, a directory is entered when either accepts it.
pub(crate) fn build_filter(patterns: &[String], levels: &[usize]) -> Result<Box<dyn ScriptFilter>> {
    match (patterns.is_empty(), levels.is_empty()) {
        (true, true) => Ok(Box::new(AcceptAll)),
        (false, true) => Ok(Box::new(RegexFilter::new(patterns)?)),
        (true, false) => Ok(Box::new(LevelFilter::new(levels.iter().copied()))),
        (false, false) => {
            let regex = RegexFilter::new(patterns)?;
            let by_level = LevelFilter::new(levels.iter().copied());
            Ok(Box::new(FnFilter::new(move |name, version, level| {
                regex.matches(name, version, level) || by_level.matches(name, version, level)
            })))
        }
    }
}

/// Build the version manager selected by the versioning flags, `None` when
/// tracking is disabled.
pub(crate) fn build_version_manager(
    args: &VersioningArgs,
    config: &Config,
) -> Result<Option<Box<dyn VersionManager>>> {
    if args.no_versioning {
        return Ok(None);
    }

    if let (Some(table), Some(column)) = (&args.version_table, &args.version_column) {
        let mut manager = ExistingTableVersioning::new(table, column);
        if args.missing_as_zero {
            manager = manager.missing_as_zero();
        }
        return Ok(Some(Box::new(manager)));
    }

    let default_version =
        Version::parse(&args.default_version).context("Invalid --default-version")?;
    let table = args
        .settings_table
        .as_deref()
        .or(config.settings_table.as_deref())
        .unwrap_or("Settings");
    Ok(Some(Box::new(SettingsVersioning::with_table(
        table,
        default_version,
    ))))
}

/// JSON envelope written by `run --report`.
#[derive(Debug, Serialize)]
pub(crate) struct RunReportFile<'a> {
    pub timestamp: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub applied: usize,
    pub skipped: usize,
    pub success: bool,
    pub results: &'a [ScriptResult],
}

/// Serialize `data` as pretty-printed JSON and write it to `path`.
///
/// Creates any missing parent directories before writing.
pub(crate) fn write_json_results<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create report directory")?;
    }
    let json = serde_json::to_string_pretty(data).context("Failed to serialize results")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Table-printing utilities
// ---------------------------------------------------------------------------

/// Calculate column widths for a table given headers and row data.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }
    widths
}

/// Print a formatted table to stdout: a header row, a dash separator, and
/// left-aligned data rows, columns separated by two spaces.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);

    let header_parts: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| format!("{:<width$}", h, width = w))
        .collect();
    println!("{}", header_parts.join("  "));

    let sep_parts: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep_parts.join("  "));

    for row in rows {
        let row_parts: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect();
        println!("{}", row_parts.join("  "));
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
