//! Migration script model: lazy statement loading and parameter substitution.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::params::ScriptParams;
use crate::version::Version;

fn batch_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The batch separator keyword alone on a line, any surrounding
    // whitespace, any case.
    RE.get_or_init(|| Regex::new(r"(?im)^\s*GO\s*$").expect("batch separator pattern"))
}

fn placeholder_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\(([^)]+)\)").expect("placeholder pattern"))
}

/// Where a script's text comes from.
#[derive(Debug, Clone)]
enum ScriptSource {
    /// A file discovered by the scanner; read at load time.
    File(PathBuf),
    /// Statements synthesized in memory (e.g. database creation).
    Inline(Vec<String>),
}

/// Loaded/unloaded statement state.
///
/// Keeping this an explicit enum makes "load before execute" a checked
/// precondition instead of an unwrap on a nullable field.
#[derive(Debug, Clone)]
enum LoadState {
    Unloaded,
    Loaded(Vec<String>),
}

/// A single migration script, ordered by its destination [`Version`].
///
/// Statements are populated on demand by [`load`](Self::load) right before
/// execution and discarded by [`unload`](Self::unload) right after, so a
/// batch with many large scripts holds at most one script's text in memory.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationScript {
    version: Version,
    name: String,
    relative_path: String,
    #[serde(skip)]
    source: ScriptSource,
    #[serde(skip)]
    state: LoadState,
}

impl MigrationScript {
    /// Script backed by a file on disk. `relative_path` is the
    /// slash-normalized path from the scan root, kept for diagnostics.
    pub fn from_file(
        version: Version,
        name: impl Into<String>,
        relative_path: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            version,
            name: name.into(),
            relative_path: relative_path.into(),
            source: ScriptSource::File(path.into()),
            state: LoadState::Unloaded,
        }
    }

    /// Script synthesized from in-memory statements. The statements still go
    /// through the trim/substitute pipeline on load.
    pub fn from_statements(
        version: Version,
        name: impl Into<String>,
        statements: Vec<String>,
    ) -> Self {
        let name = name.into();
        Self {
            version,
            relative_path: name.clone(),
            name,
            source: ScriptSource::Inline(statements),
            state: LoadState::Unloaded,
        }
    }

    /// Destination version this script updates the database to.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Display name parsed from the filename.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slash-normalized path relative to the scan root.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LoadState::Loaded(_))
    }

    /// Read the script text, split it into batch-separated statements, and
    /// substitute parameters.
    ///
    /// Substitution is a single pass: every `$(Name)` token is replaced by
    /// the first case-insensitive parameter match, and replacement values
    /// containing placeholder tokens are never re-substituted. Unknown
    /// tokens are left untouched. Chunks that trim to nothing are dropped.
    pub fn load(&mut self, params: &ScriptParams) -> CoreResult<()> {
        let chunks: Vec<String> = match &self.source {
            ScriptSource::File(path) => {
                let text =
                    std::fs::read_to_string(path).map_err(|source| CoreError::IoWithPath {
                        path: path.display().to_string(),
                        source,
                    })?;
                batch_separator()
                    .split(&text)
                    .map(str::to_string)
                    .collect()
            }
            ScriptSource::Inline(statements) => statements.clone(),
        };

        let mut statements = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let trimmed = chunk.trim();
            if trimmed.is_empty() {
                continue;
            }
            let statement = if params.is_empty() {
                trimmed.to_string()
            } else {
                substitute(trimmed, params)
            };
            if statement.trim().is_empty() {
                continue;
            }
            statements.push(statement);
        }

        self.state = LoadState::Loaded(statements);
        Ok(())
    }

    /// Discard the loaded statements. Safe to call when nothing is loaded.
    pub fn unload(&mut self) {
        self.state = LoadState::Unloaded;
    }

    /// The loaded statement sequence; an error when the script has not been
    /// loaded yet.
    pub fn statements(&self) -> CoreResult<&[String]> {
        match &self.state {
            LoadState::Loaded(statements) => Ok(statements),
            LoadState::Unloaded => Err(CoreError::ScriptNotLoaded {
                script: self.relative_path.clone(),
            }),
        }
    }

    /// Case-insensitive substring search across the currently loaded
    /// statements. An unloaded script never matches.
    pub fn contains(&self, needle: &str) -> bool {
        let LoadState::Loaded(statements) = &self.state else {
            return false;
        };
        let needle = needle.to_lowercase();
        statements.iter().any(|s| s.to_lowercase().contains(&needle))
    }
}

/// Replace every `$(Name)` token in one pass over the text.
fn substitute(text: &str, params: &ScriptParams) -> String {
    placeholder_pattern()
        .replace_all(text, |captures: &Captures<'_>| {
            match params.value_of(&captures[1]) {
                Some(value) => value.to_string(),
                None => captures[0].to_string(),
            }
        })
        .into_owned()
}

// Scripts are ordered and compared by version alone; the scanner guarantees
// versions are unique within a batch.
impl PartialEq for MigrationScript {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl Eq for MigrationScript {}

impl PartialOrd for MigrationScript {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MigrationScript {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version.cmp(&other.version)
    }
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
