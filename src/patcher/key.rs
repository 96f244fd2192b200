//! Validated keys and section headers

use super::errors::PatchError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_.-]*$").expect("key pattern is a valid regex")
});

/// A configuration key that is safe to embed in a line pattern
///
/// # Example
///
/// ```rust
/// use cfgpatch::ConfigKey;
///
/// assert!(ConfigKey::new("bind-address").is_ok());
/// assert!(ConfigKey::new("net.core.somaxconn").is_ok());
/// assert!(ConfigKey::new("1bad-key").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConfigKey(String);

impl ConfigKey {
    /// Validates and wraps a key
    ///
    /// # Errors
    ///
    /// Returns `PatchError::InvalidKey` if the key does not match
    /// `^[A-Za-z_][A-Za-z0-9_.-]*$`.
    pub fn new(key: impl Into<String>) -> Result<Self, PatchError> {
        let key = key.into();
        if KEY_PATTERN.is_match(&key) {
            Ok(Self(key))
        } else {
            Err(PatchError::InvalidKey { key })
        }
    }

    /// Returns the key as written by the caller
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ConfigKey {
    type Error = PatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConfigKey> for String {
    fn from(key: ConfigKey) -> Self {
        key.0
    }
}

/// An INI section header such as `[mysqld]`
///
/// Accepts both the bare name and the bracketed form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionHeader(String);

impl SectionHeader {
    /// Parses `mysqld` or `[mysqld]`
    ///
    /// # Errors
    ///
    /// Returns `PatchError::InvalidSection` for empty names or names
    /// containing brackets or line breaks.
    pub fn new(section: impl Into<String>) -> Result<Self, PatchError> {
        let raw = section.into();
        let trimmed = raw.trim();
        let name = trimmed
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(trimmed)
            .trim();

        let invalid = name.is_empty()
            || name
                .chars()
                .any(|c| matches!(c, '[' | ']' | '\n' | '\r'));
        if invalid {
            return Err(PatchError::InvalidSection { section: raw });
        }

        Ok(Self(name.to_string()))
    }

    /// Section name without brackets
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Header line as it appears in the file
    #[must_use]
    pub fn render(&self) -> String {
        format!("[{}]", self.0)
    }

    /// Returns true if `line` is this section's header
    #[must_use]
    pub fn matches_line(&self, line: &str) -> bool {
        parse_header_line(line).is_some_and(|name| name == self.0)
    }
}

impl fmt::Display for SectionHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

impl TryFrom<String> for SectionHeader {
    type Error = PatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SectionHeader> for String {
    fn from(section: SectionHeader) -> Self {
        section.0
    }
}

/// Returns the section name if `line` is a `[name]` header
///
/// A trailing `# comment` after the closing bracket is allowed.
pub(crate) fn parse_header_line(line: &str) -> Option<&str> {
    let header = line.split_once('#').map_or(line, |(head, _)| head);
    header
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .map(str::trim)
}
