//! Idempotent key/value patching of text configuration files
//!
//! The patcher ensures a key is set to a value in an INI-style
//! (`my.cnf`, `sysctl.conf`) or sshd-style (`sshd_config`) file:
//!
//! 1. Every line assigning the key is located, whether active or commented
//!    out (`#bind-address = 127.0.0.1`).
//! 2. The last such line is rewritten as an active assignment. Earlier
//!    matches are left alone; enable [`PatchOptions::strict`] to reject
//!    files with more than one match instead.
//! 3. With no match, the line is inserted right after the section header,
//!    creating the header at end of file when needed.
//!
//! Applying the same upsert twice leaves the file byte-identical.
//!
//! ## Concurrency
//!
//! Files are rewritten in place without locking. Two processes patching the
//! same file at once can interleave and leave duplicate active assignments;
//! run one patcher per host at a time.
//!
//! ## Example
//!
//! ```rust
//! use cfgpatch::{ConfigPatcher, PatchOptions};
//! use tempfile::TempDir;
//!
//! let temp_dir = TempDir::new().unwrap();
//! let file = temp_dir.path().join("my.cnf");
//! std::fs::write(&file, "").unwrap();
//!
//! let patcher = ConfigPatcher::new(PatchOptions::default());
//! patcher.set_value(&file, Some("[mysqld]"), "max_connections", "500").unwrap();
//!
//! assert_eq!(
//!     std::fs::read_to_string(&file).unwrap(),
//!     "[mysqld]\nmax_connections = 500\n"
//! );
//! ```

pub mod backup;
mod document;
mod errors;
mod key;
mod session;
mod syntax;

pub use document::{ConfigDocument, LineEnding, PatchOutcome};
pub use errors::{PatchError, PlanError};
pub use key::{ConfigKey, SectionHeader};
pub use session::{BackupPolicy, PatchOptions, PatchSession};
pub use syntax::{KeyMatcher, LineSyntax, is_comment};

use std::path::Path;

/// Stateless front end over [`PatchSession`]
///
/// Each call runs in its own session, so every mutating call takes its own
/// backup (unless backups are disabled). Use [`ConfigPatcher::session`] to
/// share one backup across several upserts.
#[derive(Debug, Clone, Default)]
pub struct ConfigPatcher {
    options: PatchOptions,
}

impl ConfigPatcher {
    /// Creates a patcher with the given options
    #[must_use]
    pub fn new(options: PatchOptions) -> Self {
        Self { options }
    }

    /// Patcher options
    #[must_use]
    pub fn options(&self) -> &PatchOptions {
        &self.options
    }

    /// Starts a session using this patcher's options
    #[must_use]
    pub fn session(&self) -> PatchSession {
        PatchSession::new(self.options.clone())
    }

    /// Sets `key` to `value` in `file`, see [`PatchSession::set_value`]
    ///
    /// # Errors
    ///
    /// See [`PatchSession::set_value`].
    pub fn set_value(
        &self,
        file: &Path,
        section: Option<&str>,
        key: &str,
        value: &str,
    ) -> Result<PatchOutcome, PatchError> {
        self.session().set_value(file, section, key, value)
    }

    /// Reads the active value of `key`, see [`PatchSession::get_value`]
    ///
    /// # Errors
    ///
    /// See [`PatchSession::get_value`].
    pub fn get_value(
        &self,
        file: &Path,
        section: Option<&str>,
        key: &str,
    ) -> Result<Option<String>, PatchError> {
        self.session().get_value(file, section, key)
    }
}
