//! Error types for dbm-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    Connection(String),

    /// Statement execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    Execution(String),

    /// Table not found (D003)
    #[error("[D003] Table not found: {0}")]
    TableNotFound(String),

    /// The recorded schema version could not be established (D004)
    #[error("[D004] Database version could not be determined: {0}")]
    VersionNotDetermined(String),

    /// Neither a script nor a version parameter supplied a version (D005)
    #[error("[D005] No version value available to record")]
    MissingVersion,

    /// Update called on a read-only version manager (D006)
    #[error("[D006] Version manager for table '{0}' is read-only")]
    ReadOnly(String),

    /// Core-layer error surfaced through the engine (D007)
    #[error("[D007] {0}")]
    Core(#[from] dbm_core::CoreError),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<tokio_postgres::Error> for DbError {
    fn from(err: tokio_postgres::Error) -> Self {
        DbError::Execution(err.to_string())
    }
}
