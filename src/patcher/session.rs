//! Patch sessions
//!
//! A session is a sequence of upserts that share one backup record: the
//! first write to a file takes a backup, later writes to the same file in
//! the same session do not.

use super::backup;
use super::document::{ConfigDocument, PatchOutcome};
use super::errors::PatchError;
use super::key::{ConfigKey, SectionHeader};
use super::syntax::LineSyntax;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Where backups go
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BackupPolicy {
    /// No backups
    Disabled,
    /// Next to the patched file
    #[default]
    NextToFile,
    /// Inside the given directory
    Directory(PathBuf),
}

impl BackupPolicy {
    fn dir(&self) -> Option<&Path> {
        match self {
            Self::Directory(dir) => Some(dir),
            _ => None,
        }
    }
}

/// Options shared by every operation of a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchOptions {
    /// Line syntax of the target files
    pub syntax: LineSyntax,
    /// Fail with `AmbiguousKey` when a key is assigned more than once
    pub strict: bool,
    /// Only look for existing assignments inside the target section
    pub scoped: bool,
    /// Backup behavior before the first write to a file
    pub backup: BackupPolicy,
    /// Compute outcomes without touching the disk
    pub dry_run: bool,
}

impl PatchOptions {
    /// Options for the given syntax, everything else default
    #[must_use]
    pub fn with_syntax(syntax: LineSyntax) -> Self {
        Self {
            syntax,
            ..Self::default()
        }
    }
}

/// A sequence of patch operations sharing one backup record
#[derive(Debug, Clone)]
pub struct PatchSession {
    options: PatchOptions,
    backups: HashMap<PathBuf, PathBuf>,
    staged: HashMap<PathBuf, String>,
}

impl PatchSession {
    /// Starts a new session
    #[must_use]
    pub fn new(options: PatchOptions) -> Self {
        Self {
            options,
            backups: HashMap::new(),
            staged: HashMap::new(),
        }
    }

    /// Session options
    #[must_use]
    pub fn options(&self) -> &PatchOptions {
        &self.options
    }

    /// Overrides the line syntax for subsequent operations
    pub fn set_syntax(&mut self, syntax: LineSyntax) {
        self.options.syntax = syntax;
    }

    /// Backup taken for `file` during this session, if any
    #[must_use]
    pub fn backup_of(&self, file: &Path) -> Option<&Path> {
        self.backups.get(file).map(PathBuf::as_path)
    }

    /// Content a dry run would have written to `file`
    #[must_use]
    pub fn staged_content(&self, file: &Path) -> Option<&str> {
        self.staged.get(file).map(String::as_str)
    }

    /// Sets `key` to `value` in `file`
    ///
    /// # Arguments
    ///
    /// * `file` - Existing, writable configuration file
    /// * `section` - Target section (`mysqld` or `[mysqld]`), ignored for
    ///   flat syntaxes
    /// * `key` - Key matching `^[A-Za-z_][A-Za-z0-9_.-]*$`
    /// * `value` - Single-line value, written as given
    ///
    /// # Errors
    ///
    /// Key, value and section are validated before the file is touched;
    /// an invalid argument never modifies the file. See [`PatchError`] for
    /// the full list.
    pub fn set_value(
        &mut self,
        file: &Path,
        section: Option<&str>,
        key: &str,
        value: &str,
    ) -> Result<PatchOutcome, PatchError> {
        let key = ConfigKey::new(key)?;
        validate_value(&key, value)?;
        let section = self.resolve_section(section)?;
        let syntax = self.options.syntax;

        ensure_writable(file)?;
        let mut doc = ConfigDocument::parse(&self.read(file)?);

        let matcher = syntax.matcher(&key)?;
        let scope = if self.options.scoped {
            section.as_ref()
        } else {
            None
        };
        let matches = doc.find_assignments(&matcher, scope);
        tracing::debug!(
            file = %file.display(),
            key = %key,
            matches = matches.len(),
            "Scanned for assignments"
        );

        if self.options.strict && matches.len() > 1 {
            return Err(PatchError::AmbiguousKey {
                path: file.to_path_buf(),
                key: key.to_string(),
                lines: matches.iter().map(|i| i + 1).collect(),
            });
        }

        let outcome = doc.upsert(
            syntax,
            section.as_ref(),
            &matches,
            syntax.render(&key, value),
        );
        if !outcome.is_change() {
            tracing::debug!(file = %file.display(), key = %key, "Already set");
            return Ok(outcome);
        }

        let rendered = doc.render();
        if self.options.dry_run {
            self.staged.insert(file.to_path_buf(), rendered);
            return Ok(outcome);
        }

        self.backup_once(file)?;

        fs::write(file, rendered).map_err(|e| {
            if let (true, Some(section)) = (outcome.section_created(), section.as_ref()) {
                PatchError::SectionCreateFailed {
                    path: file.to_path_buf(),
                    section: section.render(),
                    reason: e.to_string(),
                }
            } else {
                PatchError::from_io(file, &e)
            }
        })?;

        tracing::info!(file = %file.display(), key = %key, %outcome, "Patched config");
        Ok(outcome)
    }

    /// Reads the value of the last active assignment of `key`
    ///
    /// # Errors
    ///
    /// Returns `PatchError::FileNotFound`, `PatchError::InvalidKey` or
    /// `PatchError::InvalidSection`.
    pub fn get_value(
        &self,
        file: &Path,
        section: Option<&str>,
        key: &str,
    ) -> Result<Option<String>, PatchError> {
        let key = ConfigKey::new(key)?;
        let section = self.resolve_section(section)?;
        let doc = ConfigDocument::parse(&self.read(file)?);

        let matcher = self.options.syntax.matcher(&key)?;
        let scope = if self.options.scoped {
            section.as_ref()
        } else {
            None
        };
        let matches = doc.find_assignments(&matcher, scope);
        Ok(doc.active_value(&matcher, &matches))
    }

    fn resolve_section(&self, section: Option<&str>) -> Result<Option<SectionHeader>, PatchError> {
        let section = section.map(SectionHeader::new).transpose()?;
        if section.is_some() && !self.options.syntax.has_sections() {
            tracing::warn!(
                syntax = %self.options.syntax,
                "Section ignored for flat config syntax"
            );
            return Ok(None);
        }
        Ok(section)
    }

    fn read(&self, file: &Path) -> Result<String, PatchError> {
        if let Some(staged) = self.staged.get(file) {
            return Ok(staged.clone());
        }
        fs::read_to_string(file).map_err(|e| PatchError::from_io(file, &e))
    }

    fn backup_once(&mut self, file: &Path) -> Result<(), PatchError> {
        if self.options.backup == BackupPolicy::Disabled || self.backups.contains_key(file) {
            return Ok(());
        }
        let backup = backup::create_backup(file, self.options.backup.dir())?;
        self.backups.insert(file.to_path_buf(), backup);
        Ok(())
    }
}

fn validate_value(key: &ConfigKey, value: &str) -> Result<(), PatchError> {
    if value.contains(['\n', '\r']) {
        return Err(PatchError::InvalidValue {
            key: key.to_string(),
            reason: "value must not contain a line break".to_string(),
        });
    }
    Ok(())
}

fn ensure_writable(file: &Path) -> Result<(), PatchError> {
    let metadata = fs::metadata(file).map_err(|e| PatchError::from_io(file, &e))?;
    if !metadata.is_file() {
        return Err(PatchError::Io {
            path: file.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }
    OpenOptions::new()
        .append(true)
        .open(file)
        .map_err(|e| PatchError::from_io(file, &e))?;
    Ok(())
}
