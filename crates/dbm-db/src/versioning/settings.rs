//! Version tracking in a dedicated settings table.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dbm_core::{MigrationScript, ScriptParam, ScriptParams, Version, PARAM_DB_VERSION};

use crate::error::{DbError, DbResult};
use crate::executor::DbExecutor;
use crate::sql::quote_ident;

use super::{resolve_version, VersionManager};

const VERSION_KEY: &str = "Version";

/// Tracks the schema version in a dedicated two-column table
/// (`"Name"`/`"Value"`, one row keyed `Version`), created on first use.
///
/// A missing table is the first-run case, not an error: `get_version`
/// creates and seeds it with the configured default version, and `update`
/// creates and seeds it with the version being recorded.
pub struct SettingsVersioning {
    table: String,
    default_version: Version,
    skipped: AtomicUsize,
}

impl SettingsVersioning {
    pub fn new() -> Self {
        Self::with_table("Settings", Version::new(&[1, 0]))
    }

    pub fn with_table(table: impl Into<String>, default_version: Version) -> Self {
        Self {
            table: table.into(),
            default_version,
            skipped: AtomicUsize::new(0),
        }
    }

    /// Number of scripts skipped during the current batch.
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    async fn create_and_seed(&self, executor: &dyn DbExecutor, version: &Version) -> DbResult<()> {
        let create = format!(
            "CREATE TABLE {} (\"Name\" varchar(20) NOT NULL PRIMARY KEY, \"Value\" varchar(256) NOT NULL)",
            quote_ident(&self.table)
        );
        executor.execute(&create, &[]).await?;

        let param = ScriptParam::new(PARAM_DB_VERSION, version.to_string());
        let seed = format!(
            "INSERT INTO {} (\"Name\", \"Value\") VALUES ('{}', {})",
            quote_ident(&self.table),
            VERSION_KEY,
            param.bind_name()
        );
        executor.execute(&seed, &[param]).await?;

        log::info!("Initialized database version: {}", version);
        Ok(())
    }
}

impl Default for SettingsVersioning {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VersionManager for SettingsVersioning {
    async fn get_version(&self, executor: &dyn DbExecutor) -> DbResult<Version> {
        if !executor.table_exists(&self.table).await? {
            self.create_and_seed(executor, &self.default_version).await?;
            return Ok(self.default_version);
        }

        let query = format!(
            "SELECT \"Value\" FROM {} WHERE \"Name\" = '{}'",
            quote_ident(&self.table),
            VERSION_KEY
        );
        match executor.query_scalar(&query, &[]).await? {
            Some(text) => Version::parse(&text).map_err(|_| {
                DbError::VersionNotDetermined(format!(
                    "stored value '{}' in table '{}' is not a version",
                    text, self.table
                ))
            }),
            None => Err(DbError::VersionNotDetermined(format!(
                "table '{}' has no '{}' row",
                self.table, VERSION_KEY
            ))),
        }
    }

    async fn update(
        &self,
        executor: &dyn DbExecutor,
        script: Option<&MigrationScript>,
        _batch_index: usize,
        params: &ScriptParams,
    ) -> DbResult<()> {
        let version = resolve_version(script, params)?;

        if !executor.table_exists(&self.table).await? {
            return self.create_and_seed(executor, &version).await;
        }

        // The new value travels as a bound parameter, never inside the SQL.
        let param = ScriptParam::new(PARAM_DB_VERSION, version.to_string());
        let update = format!(
            "UPDATE {} SET \"Value\" = {} WHERE \"Name\" = '{}'",
            quote_ident(&self.table),
            param.bind_name(),
            VERSION_KEY
        );
        log::debug!("Updating database version to: {}", version);
        executor.execute(&update, &[param]).await?;
        Ok(())
    }

    async fn on_skipped(
        &self,
        _executor: &dyn DbExecutor,
        _script: &MigrationScript,
        _batch_index: usize,
        _params: &ScriptParams,
    ) -> DbResult<()> {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
