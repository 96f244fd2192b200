//! `cfgpatch backup` / `cfgpatch restore` - Manual backup handling
//!
//! ## Usage
//!
//! ```bash
//! cfgpatch backup /etc/ssh/sshd_config
//! cfgpatch restore /etc/ssh/sshd_config
//! cfgpatch restore /etc/ssh/sshd_config --from /etc/ssh/sshd_config.bak.20240101_120000
//! ```

use anyhow::{Context, Result};
use cfgpatch::backup;
use std::path::{Path, PathBuf};

/// Takes a timestamped backup of `file`
pub fn backup_file(file: &Path, dir: Option<&Path>) -> Result<PathBuf> {
    backup::create_backup(file, dir).with_context(|| format!("Failed to back up {}", file.display()))
}

/// Restores `file` from `from`, or from its latest backup
///
/// # Returns
///
/// The backup that was restored.
pub fn restore_file(file: &Path, from: Option<&Path>, dir: Option<&Path>) -> Result<PathBuf> {
    let source = match from {
        Some(path) => path.to_path_buf(),
        None => backup::latest_backup(file, dir)?
            .with_context(|| format!("No backup found for {}", file.display()))?,
    };

    backup::restore_backup(&source, file)
        .with_context(|| format!("Failed to restore {}", file.display()))?;
    Ok(source)
}
