//! Version tracking strategies.
//!
//! A [`VersionManager`] persists and retrieves the database's currently
//! applied schema version. The engine consults it per script to decide
//! skip-vs-apply and to record progress.

pub mod existing;
pub mod settings;

use async_trait::async_trait;
use dbm_core::{MigrationScript, ScriptParams, Version, PARAM_DB_VERSION};

use crate::error::{DbError, DbResult};
use crate::executor::DbExecutor;

pub use existing::ExistingTableVersioning;
pub use settings::SettingsVersioning;

/// Pluggable strategy persisting the database's applied schema version.
#[async_trait]
pub trait VersionManager: Send + Sync {
    /// The currently recorded schema version.
    ///
    /// Fails with [`DbError::VersionNotDetermined`] when no version can be
    /// established; the engine aborts a versioned run on any failure here.
    async fn get_version(&self, executor: &dyn DbExecutor) -> DbResult<Version>;

    /// Record a new version, sourced from `script` when given, otherwise
    /// from the `DbVersion` parameter.
    async fn update(
        &self,
        executor: &dyn DbExecutor,
        script: Option<&MigrationScript>,
        batch_index: usize,
        params: &ScriptParams,
    ) -> DbResult<()>;

    /// Notification that a script was skipped because the database is
    /// already at (or past) its version. Bookkeeping only.
    async fn on_skipped(
        &self,
        executor: &dyn DbExecutor,
        script: &MigrationScript,
        batch_index: usize,
        params: &ScriptParams,
    ) -> DbResult<()>;
}

/// Version to record: the script's destination version, else the
/// `DbVersion` parameter.
fn resolve_version(
    script: Option<&MigrationScript>,
    params: &ScriptParams,
) -> DbResult<Version> {
    if let Some(script) = script {
        return Ok(*script.version());
    }
    match params.value_of(PARAM_DB_VERSION) {
        Some(text) => Version::parse(text).map_err(DbError::from),
        None => Err(DbError::MissingVersion),
    }
}

#[cfg(test)]
#[path = "versioning_test.rs"]
mod tests;
