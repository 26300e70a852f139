//! Error types for dbm-core

use thiserror::Error;

use crate::version::Version;

/// Core error type for dbmigrate
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Scan root not found
    #[error("[E001] Scripts path not found: {path}")]
    ScriptsPathNotFound { path: String },

    /// E002: Two scripts resolved to the same composite version
    #[error("[E002] Duplicate script version {version}: '{first}' and '{second}'")]
    DuplicateVersion {
        version: Version,
        first: String,
        second: String,
    },

    /// E003: Text is not a valid version
    #[error("[E003] Invalid version string: {text}")]
    InvalidVersion { text: String },

    /// E004: Statements requested before the script was loaded
    #[error("[E004] Script '{script}' is not loaded")]
    ScriptNotLoaded { script: String },

    /// E005: Invalid filter pattern
    #[error("[E005] Invalid filter pattern '{pattern}': {message}")]
    InvalidFilter { pattern: String, message: String },

    /// E006: Config file parse error
    #[error("[E006] Failed to parse config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// E007: IO error
    #[error("[E007] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E008: IO error with file path context
    #[error("[E008] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
