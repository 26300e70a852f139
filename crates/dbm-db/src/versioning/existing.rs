//! Version tracking through a column of a caller-owned table.

use async_trait::async_trait;
use dbm_core::{MigrationScript, ScriptParam, ScriptParams, Version, PARAM_DB_VERSION};

use crate::error::{DbError, DbResult};
use crate::executor::DbExecutor;
use crate::sql::quote_ident;

use super::{resolve_version, VersionManager};

/// Reads and writes a named column of an existing table. Never creates the
/// table.
///
/// Two construction-time policies:
/// - [`missing_as_zero`](Self::missing_as_zero): a missing table (or an
///   empty value) reads as `0.0.0.0` instead of failing.
/// - [`read_only`](Self::read_only): `update` fails fast, for deployments
///   where another system owns the version column.
pub struct ExistingTableVersioning {
    table: String,
    column: String,
    missing_as_zero: bool,
    read_only: bool,
}

impl ExistingTableVersioning {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            missing_as_zero: false,
            read_only: false,
        }
    }

    /// Treat a missing table or empty value as version `0.0.0.0`.
    pub fn missing_as_zero(mut self) -> Self {
        self.missing_as_zero = true;
        self
    }

    /// Reject `update` calls instead of writing the column.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    fn missing(&self, what: String) -> DbResult<Version> {
        if self.missing_as_zero {
            Ok(Version::zero())
        } else {
            Err(DbError::VersionNotDetermined(what))
        }
    }
}

#[async_trait]
impl VersionManager for ExistingTableVersioning {
    async fn get_version(&self, executor: &dyn DbExecutor) -> DbResult<Version> {
        if !executor.table_exists(&self.table).await? {
            return self.missing(format!("table '{}' does not exist", self.table));
        }

        let query = format!(
            "SELECT {} FROM {} LIMIT 1",
            quote_ident(&self.column),
            quote_ident(&self.table)
        );
        match executor.query_scalar(&query, &[]).await? {
            Some(text) if !text.is_empty() => Version::parse(&text).map_err(|_| {
                DbError::VersionNotDetermined(format!(
                    "value '{}' in {}.{} is not a version",
                    text, self.table, self.column
                ))
            }),
            _ => self.missing(format!("{}.{} holds no version", self.table, self.column)),
        }
    }

    async fn update(
        &self,
        executor: &dyn DbExecutor,
        script: Option<&MigrationScript>,
        _batch_index: usize,
        params: &ScriptParams,
    ) -> DbResult<()> {
        if self.read_only {
            return Err(DbError::ReadOnly(self.table.clone()));
        }

        let version = resolve_version(script, params)?;

        if !executor.table_exists(&self.table).await? {
            return Err(DbError::TableNotFound(self.table.clone()));
        }

        let param = ScriptParam::new(PARAM_DB_VERSION, version.to_string());
        let update = format!(
            "UPDATE {} SET {} = {}",
            quote_ident(&self.table),
            quote_ident(&self.column),
            param.bind_name()
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
        Ok(())
    }
}
