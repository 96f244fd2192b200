//! Error types for config patching

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while patching a configuration file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// Target file does not exist
    #[error("Config file not found: {}", .path.display())]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// Target file exists but cannot be written
    #[error("Permission denied: {} is not writable", .path.display())]
    PermissionDenied {
        /// Path that could not be written.
        path: PathBuf,
    },

    /// Key does not match `^[A-Za-z_][A-Za-z0-9_.-]*$`
    #[error("Invalid key '{key}': must match ^[A-Za-z_][A-Za-z0-9_.-]*$")]
    InvalidKey {
        /// The rejected key.
        key: String,
    },

    /// Value cannot be written on a single line
    #[error("Invalid value for key '{key}': {reason}")]
    InvalidValue {
        /// Key the value was meant for.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Section header is malformed
    #[error("Invalid section header '{section}'")]
    InvalidSection {
        /// The rejected header.
        section: String,
    },

    /// Writing a newly created section header failed
    #[error("Failed to create section {section} in {}: {reason}", .path.display())]
    SectionCreateFailed {
        /// File the section was added to.
        path: PathBuf,
        /// Rendered section header.
        section: String,
        /// Underlying I/O error message.
        reason: String,
    },

    /// Strict mode found more than one assignment for the key
    #[error("Key '{key}' is assigned {} times in {} (lines {lines:?})", .lines.len(), .path.display())]
    AmbiguousKey {
        /// File that was scanned.
        path: PathBuf,
        /// Key with several assignments.
        key: String,
        /// 1-based line numbers of every match.
        lines: Vec<usize>,
    },

    /// Backup could not be created or restored
    #[error("Backup of {} failed: {reason}", .path.display())]
    Backup {
        /// File being backed up or restored.
        path: PathBuf,
        /// Underlying I/O error message.
        reason: String,
    },

    /// Any other I/O failure
    #[error("IO error on {}: {reason}", .path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error message.
        reason: String,
    },
}

impl PatchError {
    /// Maps an I/O error on `path` to the matching patch error kind
    pub(crate) fn from_io(path: &Path, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Self::Io {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        }
    }
}

/// Errors raised while loading or validating a patch plan
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// Plan file could not be read
    #[error("Failed to read plan {}: {reason}", .path.display())]
    Read {
        /// Plan file path.
        path: PathBuf,
        /// Underlying I/O error message.
        reason: String,
    },

    /// Plan file is not valid YAML/JSON for the plan schema
    #[error("Failed to parse plan {}: {reason}", .path.display())]
    Parse {
        /// Plan file path.
        path: PathBuf,
        /// Parser error message.
        reason: String,
    },

    /// A file entry has nothing to set
    #[error("Plan entry for {} has no assignments", .path.display())]
    EmptyEntry {
        /// Target file of the empty entry.
        path: PathBuf,
    },

    /// Unknown preset flag
    #[error("Unknown preset '{flag}' (known: {known})")]
    UnknownPreset {
        /// Requested flag.
        flag: String,
        /// Comma separated list of valid flags.
        known: String,
    },

    /// Override given for a key no selected preset sets
    #[error("Override '{key}' does not match any key of the selected presets")]
    UnusedOverride {
        /// Override key.
        key: String,
    },

    /// Override is not in `KEY=VALUE` form
    #[error("Invalid override '{0}': expected KEY=VALUE")]
    MalformedOverride(String),

    /// A plan step failed
    #[error(transparent)]
    Patch(#[from] PatchError),
}
