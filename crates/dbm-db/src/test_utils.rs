//! In-memory fakes shared by engine and versioning tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dbm_core::{MigrationScript, ScriptParam, ScriptParams, Version, PARAM_DB_VERSION};

use crate::error::{DbError, DbResult};
use crate::executor::{DbConnection, DbExecutor};
use crate::versioning::VersionManager;

/// One statement the mock saw, with its bound parameters.
#[derive(Debug, Clone)]
pub struct ExecutedStatement {
    pub sql: String,
    pub params: Vec<(String, String)>,
}

/// Connection fake recording every statement. A statement containing
/// `fail_on` fails with an execution error.
#[derive(Default)]
pub struct MockConnection {
    pub executed: Mutex<Vec<ExecutedStatement>>,
    pub queries: Mutex<Vec<String>>,
    pub tables: Mutex<HashSet<String>>,
    pub scalar_results: Mutex<Vec<Option<String>>>,
    pub fail_on: Option<String>,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
    in_transaction: bool,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: Some(needle.to_string()),
            ..Self::default()
        }
    }

    pub fn add_table(&self, table: &str) {
        self.tables.lock().unwrap().insert(table.to_string());
    }

    /// Queue the result of the next `query_scalar` call.
    pub fn push_scalar(&self, value: Option<&str>) {
        self.scalar_results
            .lock()
            .unwrap()
            .push(value.map(str::to_string));
    }

    pub fn statements(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.sql.clone())
            .collect()
    }

    pub fn executed_log(&self) -> Vec<ExecutedStatement> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl DbExecutor for MockConnection {
    async fn execute(&self, statement: &str, params: &[ScriptParam]) -> DbResult<u64> {
        if let Some(needle) = &self.fail_on {
            if statement.contains(needle.as_str()) {
                return Err(DbError::Execution(format!("forced failure on '{needle}'")));
            }
        }
        self.executed.lock().unwrap().push(ExecutedStatement {
            sql: statement.to_string(),
            params: params
                .iter()
                .map(|p| (p.name().to_string(), p.value().to_string()))
                .collect(),
        });
        Ok(1)
    }

    async fn query_scalar(
        &self,
        statement: &str,
        _params: &[ScriptParam],
    ) -> DbResult<Option<String>> {
        self.queries.lock().unwrap().push(statement.to_string());
        let mut queued = self.scalar_results.lock().unwrap();
        if queued.is_empty() {
            Ok(None)
        } else {
            Ok(queued.remove(0))
        }
    }

    async fn table_exists(&self, table: &str) -> DbResult<bool> {
        Ok(self.tables.lock().unwrap().contains(table))
    }
}

#[async_trait]
impl DbConnection for MockConnection {
    async fn begin(&mut self) -> DbResult<()> {
        self.begins += 1;
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> DbResult<()> {
        if self.in_transaction {
            self.commits += 1;
            self.in_transaction = false;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> DbResult<()> {
        if self.in_transaction {
            self.rollbacks += 1;
            self.in_transaction = false;
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }
}

/// Version manager fake holding the "recorded" version in memory.
pub struct MockVersionManager {
    pub version: Mutex<Version>,
    pub updates: Mutex<Vec<Version>>,
    pub skipped: AtomicUsize,
    undetermined: bool,
}

impl MockVersionManager {
    pub fn at(version: Version) -> Self {
        Self {
            version: Mutex::new(version),
            updates: Mutex::new(Vec::new()),
            skipped: AtomicUsize::new(0),
            undetermined: false,
        }
    }

    /// A manager whose `get_version` always fails.
    pub fn undetermined() -> Self {
        Self {
            undetermined: true,
            ..Self::at(Version::zero())
        }
    }

    pub fn current(&self) -> Version {
        *self.version.lock().unwrap()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn recorded(&self) -> Vec<Version> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl VersionManager for MockVersionManager {
    async fn get_version(&self, _executor: &dyn DbExecutor) -> DbResult<Version> {
        if self.undetermined {
            return Err(DbError::VersionNotDetermined("mock".to_string()));
        }
        Ok(self.current())
    }

    async fn update(
        &self,
        _executor: &dyn DbExecutor,
        script: Option<&MigrationScript>,
        _batch_index: usize,
        params: &ScriptParams,
    ) -> DbResult<()> {
        let version = match script {
            Some(script) => *script.version(),
            None => params
                .value_of(PARAM_DB_VERSION)
                .ok_or(DbError::MissingVersion)
                .and_then(|text| Version::parse(text).map_err(DbError::from))?,
        };
        *self.version.lock().unwrap() = version;
        self.updates.lock().unwrap().push(version);
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
