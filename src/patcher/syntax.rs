//! Line syntaxes understood by the patcher
//!
//! | Syntax | Line form | Sections | Key match |
//! |--------|-----------|----------|-----------|
//! | `Ini` | `key = value` | `[name]` headers | case-sensitive |
//! | `Ssh` | `Key Value` | none (flat) | case-insensitive |
//!
//! Both syntaxes treat an assignment preceded by any run of `#` and
//! whitespace as a commented-out assignment of the same key.

use super::errors::PatchError;
use super::key::ConfigKey;
use clap::ValueEnum;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Assignment line format of a configuration file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LineSyntax {
    /// `key = value` with `[section]` headers (my.cnf, sysctl.conf)
    #[default]
    Ini,
    /// `Key Value`, flat (sshd_config, ssh_config)
    Ssh,
}

impl LineSyntax {
    /// Whether this syntax groups assignments under `[section]` headers
    #[must_use]
    pub fn has_sections(self) -> bool {
        matches!(self, Self::Ini)
    }

    /// Renders an active assignment line
    #[must_use]
    pub fn render(self, key: &ConfigKey, value: &str) -> String {
        self.render_pair(key.as_str(), value)
    }

    /// Renders an assignment from an unvalidated key
    #[must_use]
    pub fn render_pair(self, key: &str, value: &str) -> String {
        match self {
            Self::Ini => format!("{key} = {value}"),
            Self::Ssh => format!("{key} {value}"),
        }
    }

    /// Builds the matcher for assignments of `key`
    ///
    /// # Errors
    ///
    /// Returns `PatchError::InvalidKey` if the pattern cannot be compiled.
    pub fn matcher(self, key: &ConfigKey) -> Result<KeyMatcher, PatchError> {
        let escaped = regex::escape(key.as_str());
        let (pattern, case_insensitive) = match self {
            Self::Ini => (format!(r"^[#\s]*{escaped}\s*="), false),
            Self::Ssh => (format!(r"^[#\s]*{escaped}(\s|$)"), true),
        };

        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|_| PatchError::InvalidKey {
                key: key.to_string(),
            })?;

        Ok(KeyMatcher { syntax: self, regex })
    }
}

impl fmt::Display for LineSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ini => write!(f, "ini"),
            Self::Ssh => write!(f, "ssh"),
        }
    }
}

/// Compiled line pattern for one key
#[derive(Debug, Clone)]
pub struct KeyMatcher {
    syntax: LineSyntax,
    regex: Regex,
}

impl KeyMatcher {
    /// Returns true if `line` assigns the key, commented or not
    #[must_use]
    pub fn is_assignment(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    /// Returns the value if `line` is an active assignment of the key
    #[must_use]
    pub fn active_value<'a>(&self, line: &'a str) -> Option<&'a str> {
        if is_comment(line) {
            return None;
        }
        let found = self.regex.find(line)?;
        Some(line[found.end()..].trim())
    }

    /// Syntax this matcher was built for
    #[must_use]
    pub fn syntax(&self) -> LineSyntax {
        self.syntax
    }
}

/// Returns true for lines whose first non-blank character is `#`
#[must_use]
pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}
