//! dbm-core - Core library for dbmigrate
//!
//! This crate provides the composite version model, the hierarchical script
//! scanner and its filters, the migration script loader with parameter
//! substitution, and project configuration parsing shared across all
//! dbmigrate components.

pub mod config;
pub mod error;
pub mod filter;
pub mod params;
pub mod scanner;
pub mod script;
pub mod version;

pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use filter::{AcceptAll, FnFilter, LevelFilter, RegexFilter, ScriptFilter};
pub use params::{
    ScriptParam, ScriptParams, PARAM_APP_NAME, PARAM_APP_VERSION, PARAM_DB_COLLATION,
    PARAM_DB_NAME, PARAM_DB_SERVER, PARAM_DB_TABLESPACE, PARAM_DB_VERSION,
};
pub use scanner::load_scripts;
pub use script::MigrationScript;
pub use version::{parse_name, ParsedName, Version};
