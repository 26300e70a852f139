//! Database executor and connection traits.

use async_trait::async_trait;
use dbm_core::ScriptParam;

use crate::error::DbResult;

/// Operations over an open database connection (or its active transaction).
///
/// This is what version managers are handed: enough to run bookkeeping
/// statements without owning the connection. Parameter values are bound via
/// the driver using each param's `:name` marker, never interpolated into the
/// statement text. Every supplied parameter must be referenced by the
/// statement.
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait DbExecutor: Send + Sync {
    /// Execute a statement, returning the affected row count when the
    /// driver reports one.
    async fn execute(&self, statement: &str, params: &[ScriptParam]) -> DbResult<u64>;

    /// Execute a query returning a single text scalar; `None` when the
    /// query yields no row or a NULL value.
    async fn query_scalar(&self, statement: &str, params: &[ScriptParam])
        -> DbResult<Option<String>>;

    /// Whether a table exists in the connection's current schema.
    async fn table_exists(&self, table: &str) -> DbResult<bool>;
}

/// A connection owned by the execution engine, adding transaction control
/// on top of [`DbExecutor`].
///
/// `commit` and `rollback` are no-ops when no transaction is open, matching
/// the engine's "commit is a no-op if none was opened" rule.
#[async_trait]
pub trait DbConnection: DbExecutor {
    async fn begin(&mut self) -> DbResult<()>;

    async fn commit(&mut self) -> DbResult<()>;

    async fn rollback(&mut self) -> DbResult<()>;

    fn in_transaction(&self) -> bool;
}
