//! Script filters deciding which directories the scanner descends into.

use regex::RegexBuilder;
use std::collections::BTreeSet;

use crate::error::{CoreError, CoreResult};
use crate::version::Version;

/// Capability deciding whether the scanner descends into a directory.
///
/// Called with the directory's parsed display name, its merged composite
/// version, and the level it sits at.
pub trait ScriptFilter: Send + Sync {
    fn matches(&self, name: &str, version: &Version, level: usize) -> bool;
}

/// Accepts every directory. The scanner default.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl ScriptFilter for AcceptAll {
    fn matches(&self, _name: &str, _version: &Version, _level: usize) -> bool {
        true
    }
}

/// Accepts directories whose name matches any of the given patterns,
/// case-insensitively.
pub struct RegexFilter {
    patterns: Vec<regex::Regex>,
}

impl RegexFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> CoreResult<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| CoreError::InvalidFilter {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })?;
            compiled.push(regex);
        }
        Ok(Self { patterns: compiled })
    }
}

impl ScriptFilter for RegexFilter {
    fn matches(&self, name: &str, _version: &Version, _level: usize) -> bool {
        self.patterns.iter().any(|p| p.is_match(name))
    }
}

/// Accepts directories sitting at one of the given levels.
#[derive(Debug, Clone)]
pub struct LevelFilter {
    levels: BTreeSet<usize>,
}

impl LevelFilter {
    pub fn new(levels: impl IntoIterator<Item = usize>) -> Self {
        Self {
            levels: levels.into_iter().collect(),
        }
    }
}

impl ScriptFilter for LevelFilter {
    fn matches(&self, _name: &str, _version: &Version, level: usize) -> bool {
        self.levels.contains(&level)
    }
}

/// Wraps a caller-supplied predicate.
pub struct FnFilter {
    predicate: Box<dyn Fn(&str, &Version, usize) -> bool + Send + Sync>,
}

impl FnFilter {
    pub fn new(predicate: impl Fn(&str, &Version, usize) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
        }
    }
}

impl ScriptFilter for FnFilter {
    fn matches(&self, name: &str, version: &Version, level: usize) -> bool {
        (self.predicate)(name, version, level)
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
