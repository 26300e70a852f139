//! The migration execution engine.
//!
//! Runs an ordered script batch over one connection, one transaction per
//! script, consulting an optional [`VersionManager`] to decide skip-vs-apply
//! and to record progress.

use dbm_core::{MigrationScript, ScriptParams, Version};
use serde::Serialize;
use std::fmt;

use crate::error::DbResult;
use crate::executor::{DbConnection, DbExecutor};
use crate::versioning::VersionManager;

/// Statement fragment that forces a script to run without a transaction;
/// the dialect forbids creating a database inside one.
const CREATE_DATABASE_MARKER: &str = "CREATE DATABASE";

/// Outcome of one script within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptStatus {
    Applied,
    Skipped,
    Failed,
}

impl fmt::Display for ScriptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptStatus::Applied => write!(f, "applied"),
            ScriptStatus::Skipped => write!(f, "skipped"),
            ScriptStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Per-script entry of a [`MigrationReport`].
#[derive(Debug, Clone, Serialize)]
pub struct ScriptResult {
    pub version: Version,
    pub name: String,
    pub path: String,
    pub status: ScriptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of running a script batch.
///
/// A run either handles every script (applied or skipped) or stops at the
/// first failure; `results` then ends with the failing script and omits the
/// ones never attempted.
#[derive(Debug, Default, Serialize)]
pub struct MigrationReport {
    pub applied: usize,
    pub skipped: usize,
    pub results: Vec<ScriptResult>,
}

impl MigrationReport {
    pub fn succeeded(&self) -> bool {
        self.failure().is_none()
    }

    /// The failing script, if the run stopped early.
    pub fn failure(&self) -> Option<&ScriptResult> {
        self.results
            .iter()
            .find(|r| r.status == ScriptStatus::Failed)
    }

    /// Scripts handled successfully, applied and skipped together.
    pub fn handled(&self) -> usize {
        self.applied + self.skipped
    }
}

enum ScriptOutcome {
    Applied,
    Skipped(Version),
}

/// Run a script batch over an open connection.
///
/// Scripts are executed strictly in order; script *n+1* may depend on the
/// schema state left by script *n*. Statement failures and an undetermined
/// database version stop the run and are surfaced through the report rather
/// than as errors.
pub async fn run_scripts<C: DbConnection>(
    conn: &mut C,
    scripts: &mut [MigrationScript],
    params: &ScriptParams,
    manager: Option<&dyn VersionManager>,
) -> MigrationReport {
    let total = scripts.len();
    let mut report = MigrationReport::default();

    for (index, script) in scripts.iter_mut().enumerate() {
        log::info!(
            "Preparing {}/{} - {} ({})",
            index + 1,
            total,
            script.name(),
            script.relative_path()
        );

        let outcome = run_single_script(conn, script, index, params, manager).await;

        // Release the statements regardless of outcome.
        script.unload();

        let mut result = ScriptResult {
            version: *script.version(),
            name: script.name().to_string(),
            path: script.relative_path().to_string(),
            status: ScriptStatus::Applied,
            error: None,
        };

        match outcome {
            Ok(ScriptOutcome::Applied) => {
                report.applied += 1;
                log::info!("Executed {} ... [DONE]", script.relative_path());
            }
            Ok(ScriptOutcome::Skipped(db_version)) => {
                report.skipped += 1;
                result.status = ScriptStatus::Skipped;
                log::info!(
                    "Skipped {} (database already at {})",
                    script.relative_path(),
                    db_version
                );
            }
            Err(err) => {
                result.status = ScriptStatus::Failed;
                result.error = Some(err.to_string());
                log::error!(
                    "Error encountered during execution of '{}': {}",
                    script.relative_path(),
                    err
                );
                report.results.push(result);
                break;
            }
        }
        report.results.push(result);
    }

    report
}

async fn run_single_script<C: DbConnection>(
    conn: &mut C,
    script: &mut MigrationScript,
    index: usize,
    params: &ScriptParams,
    manager: Option<&dyn VersionManager>,
) -> DbResult<ScriptOutcome> {
    script.load(params)?;

    let transactional = !script.contains(CREATE_DATABASE_MARKER);
    if transactional {
        conn.begin().await?;
    }

    match execute_script(&*conn, script, index, params, manager, transactional).await {
        Ok(outcome) => {
            if transactional {
                conn.commit().await?;
            }
            Ok(outcome)
        }
        Err(err) => {
            if transactional {
                if let Err(rollback_err) = conn.rollback().await {
                    log::warn!(
                        "Rollback of '{}' failed: {}",
                        script.relative_path(),
                        rollback_err
                    );
                }
            }
            Err(err)
        }
    }
}

async fn execute_script<C: DbConnection>(
    conn: &C,
    script: &MigrationScript,
    index: usize,
    params: &ScriptParams,
    manager: Option<&dyn VersionManager>,
    transactional: bool,
) -> DbResult<ScriptOutcome> {
    let executor: &dyn DbExecutor = conn;

    // Version check runs inside the open transaction, before any statement.
    if transactional {
        if let Some(manager) = manager {
            let current = manager.get_version(executor).await?;
            if &current >= script.version() {
                manager.on_skipped(executor, script, index, params).await?;
                return Ok(ScriptOutcome::Skipped(current));
            }
        }
    }

    for statement in script.statements()? {
        if let Err(err) = conn.execute(statement, &[]).await {
            log::error!("Failing statement:\n{}", statement);
            return Err(err);
        }
    }

    if let Some(manager) = manager {
        manager.update(executor, Some(script), index, params).await?;
    }

    Ok(ScriptOutcome::Applied)
}

#[cfg(test)]
#[path = "worker_test.rs"]
mod tests;
