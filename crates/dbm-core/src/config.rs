//! Optional project configuration file.
//!
//! A `dbmigrate.yml` next to the scripts lets a project pin its connection
//! and scan settings; command-line flags always override file values.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

fn default_scripts_dir() -> String {
    "scripts".to_string()
}

/// Project configuration, all fields optional.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Full connection string; takes precedence over the split fields.
    #[serde(default)]
    pub connection_string: Option<String>,

    #[serde(default)]
    pub server: Option<String>,

    #[serde(default)]
    pub database: Option<String>,

    /// Empty or missing credentials mean trusted authentication.
    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Directory scanned for migration scripts.
    #[serde(default = "default_scripts_dir")]
    pub scripts: String,

    /// Extra script parameters merged behind command-line `--param` values.
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    /// Settings-table name override for the default version manager.
    #[serde(default)]
    pub settings_table: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection_string: None,
            server: None,
            database: None,
            user: None,
            password: None,
            scripts: default_scripts_dir(),
            params: BTreeMap::new(),
            settings_table: None,
        }
    }
}

impl Config {
    /// Conventional config file name.
    pub const FILE_NAME: &'static str = "dbmigrate.yml";

    /// Parse a config file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::IoWithPath {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Load `dbmigrate.yml` from a directory if it exists, defaults
    /// otherwise.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let path = dir.join(Self::FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
