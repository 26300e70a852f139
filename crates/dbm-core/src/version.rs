//! Composite script versions and the version-prefix name parser.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::{CoreError, CoreResult};

/// A composite version with 2 to 4 numeric components
/// (major, minor, build, revision).
///
/// Components are compared left to right; a missing trailing component
/// orders below a present one, so `1.2 < 1.2.0 < 1.2.1`. The derived
/// ordering over `Option<u32>` slots gives exactly that rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    parts: [Option<u32>; 4],
}

impl Version {
    /// Build a version from up to four components. Components beyond the
    /// fourth are ignored.
    pub fn new(parts: &[u32]) -> Self {
        debug_assert!(!parts.is_empty(), "Version must have at least one part");
        let mut slots = [None; 4];
        for (slot, value) in slots.iter_mut().zip(parts.iter()) {
            *slot = Some(*value);
        }
        Self { parts: slots }
    }

    /// The all-zero four-component version, `0.0.0.0`.
    ///
    /// Used as the "no recorded version yet" baseline by version managers
    /// configured to tolerate a missing tracking table.
    pub fn zero() -> Self {
        Self {
            parts: [Some(0); 4],
        }
    }

    /// Parse a dotted version string with 1 to 4 numeric components.
    ///
    /// A single bare integer is normalized to `major.0`, matching the
    /// filename parser.
    pub fn parse(text: &str) -> CoreResult<Self> {
        let invalid = || CoreError::InvalidVersion {
            text: text.to_string(),
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let mut parts = Vec::with_capacity(4);
        for piece in trimmed.split('.') {
            if parts.len() == 4 {
                return Err(invalid());
            }
            let value: u32 = piece.parse().map_err(|_| invalid())?;
            parts.push(value);
        }
        if parts.len() == 1 {
            parts.push(0);
        }
        Ok(Self::new(&parts))
    }

    /// Component at `index` (0 = major), `None` when absent.
    pub fn part(&self, index: usize) -> Option<u32> {
        self.parts.get(index).copied().flatten()
    }

    /// Number of components actually present.
    pub fn part_count(&self) -> usize {
        self.parts.iter().flatten().count()
    }

    /// Merge a nested component's version into the version accumulated from
    /// its ancestors, keyed by the level the nested component sits at.
    ///
    /// Level 0 replaces the accumulated version outright. Levels 1 to 3 keep
    /// the first `level` accumulated slots and shift the nested components
    /// into the remaining ones, dropping any overflow. Levels of 4 and
    /// beyond carry no additional resolution and pass the accumulated
    /// version through unchanged.
    pub fn merge(&self, nested: &Version, level: usize) -> Version {
        if level == 0 {
            return *nested;
        }
        if level >= 4 {
            return *self;
        }

        let mut parts = [None; 4];
        parts[..level].copy_from_slice(&self.parts[..level]);
        let mut slot = level;
        for value in nested.parts.iter().flatten() {
            if slot == 4 {
                break;
            }
            parts[slot] = Some(*value);
            slot += 1;
        }
        Version { parts }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for value in self.parts.iter().flatten() {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", value)?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Successful result of [`parse_name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// The version extracted from the leading digits.
    pub version: Version,
    /// How many dotted components the text actually carried (1-4).
    pub parts: usize,
    /// The remainder after the separator, trimmed. Empty for bare versions.
    pub name: String,
}

fn name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // 1-4 dot-separated integers anchored at the start, then either end
        // of input or a separator run (whitespace, '-', '_') and the name.
        Regex::new(r"^(\d+(?:\.\d+){0,3})(?:[\s_-]+(.*))?$").expect("version name pattern")
    })
}

/// Extract the version prefix and display name out of a path-segment name.
///
/// Returns `None` when the text does not start with a version — the caller
/// treats such entries as non-script assets and skips them silently.
pub fn parse_name(text: &str) -> Option<ParsedName> {
    let captures = name_pattern().captures(text)?;
    let digits = captures.get(1)?.as_str();

    let parts = digits.split('.').count();
    // Components that overflow u32 disqualify the entry rather than erroring.
    let version = Version::parse(digits).ok()?;
    let name = captures
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    Some(ParsedName {
        version,
        parts,
        name,
    })
}

#[cfg(test)]
#[path = "version_test.rs"]
mod tests;
