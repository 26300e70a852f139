//! Script parameters and the ordered parameter collection.

use std::fmt;

/// Name of the parameter carrying the target database name.
pub const PARAM_DB_NAME: &str = "DbName";
/// Name of the parameter carrying a version value for version managers.
pub const PARAM_DB_VERSION: &str = "DbVersion";
/// Name of the optional collation parameter for creation scripts.
pub const PARAM_DB_COLLATION: &str = "DbCollation";
/// Name of the optional tablespace parameter for creation scripts.
pub const PARAM_DB_TABLESPACE: &str = "DbTablespace";
/// Name of the engine-injected application name parameter.
pub const PARAM_APP_NAME: &str = "AppName";
/// Name of the engine-injected application version parameter.
pub const PARAM_APP_VERSION: &str = "AppVersion";
/// Name of the engine-injected target server parameter.
pub const PARAM_DB_SERVER: &str = "DbServer";

/// A named parameter passed to migration scripts.
///
/// Two derived forms are kept in sync with the name: the in-script
/// placeholder token `$(name)` used during textual substitution, and a
/// driver-safe bound-parameter marker built by replacing every
/// non-alphanumeric character with `_` and prefixing the `:` sigil.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptParam {
    name: String,
    value: String,
    placeholder: String,
    bind_name: String,
}

impl ScriptParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let placeholder = format!("$({})", name);
        let bind_name = derive_bind_name(&name);
        Self {
            name,
            value: value.into(),
            placeholder,
            bind_name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// The `$(name)` token this parameter replaces inside script text.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// The `:name` marker used when the value is bound by the driver.
    pub fn bind_name(&self) -> &str {
        &self.bind_name
    }
}

impl fmt::Display for ScriptParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

fn derive_bind_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!(":{}", sanitized)
}

/// An insertion-ordered collection of [`ScriptParam`]s.
///
/// Name lookups are case-insensitive and resolve to the first match, so a
/// caller-supplied value shadows any identically-named default appended
/// after it.
#[derive(Debug, Clone, Default)]
pub struct ScriptParams {
    items: Vec<ScriptParam>,
}

impl ScriptParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, keeping insertion order.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.items.push(ScriptParam::new(name, value));
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// First parameter whose name matches, ignoring case.
    pub fn find(&self, name: &str) -> Option<&ScriptParam> {
        self.items
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Value of the first parameter whose name matches, ignoring case.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.find(name).map(ScriptParam::value)
    }

    /// Value of the first matching parameter, or `default` when absent.
    pub fn value_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.value_of(name).unwrap_or(default)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScriptParam> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[ScriptParam] {
        &self.items
    }
}

impl FromIterator<(String, String)> for ScriptParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.push(name, value);
        }
        params
    }
}

#[cfg(test)]
#[path = "params_test.rs"]
mod tests;
