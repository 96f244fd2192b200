//! `cfgpatch set` / `cfgpatch get` - Single key operations
//!
//! ## Usage
//!
//! ```bash
//! cfgpatch set /etc/mysql/my.cnf max_connections 500 --section mysqld
//! cfgpatch set /etc/ssh/sshd_config PasswordAuthentication no --syntax ssh
//! cfgpatch get /etc/mysql/my.cnf max_connections
//! ```

use anyhow::{Context, Result};
use cfgpatch::{ConfigPatcher, PatchOptions};
use std::path::Path;

/// Upserts `key` and describes what happened
///
/// # Returns
///
/// A one-line summary such as `my.cnf: port inserted at line 2`.
pub fn set_value(
    options: PatchOptions,
    file: &Path,
    section: Option<&str>,
    key: &str,
    value: &str,
) -> Result<String> {
    let dry_run = options.dry_run;
    let mut session = ConfigPatcher::new(options).session();

    let outcome = session
        .set_value(file, section, key, value)
        .with_context(|| format!("Failed to set '{key}' in {}", file.display()))?;

    let mut line = format!("{}: {key} {outcome}", file.display());
    if dry_run {
        line.push_str(" (dry run)");
    }
    if let Some(backup) = session.backup_of(file) {
        line.push_str(&format!("\nbackup: {}", backup.display()));
    }
    Ok(line)
}

/// Reads the active value of `key`
pub fn get_value(
    options: PatchOptions,
    file: &Path,
    section: Option<&str>,
    key: &str,
) -> Result<Option<String>> {
    ConfigPatcher::new(options)
        .get_value(file, section, key)
        .with_context(|| format!("Failed to read '{key}' from {}", file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgpatch::{BackupPolicy, LineSyntax};
    use std::fs;
    use tempfile::TempDir;

    fn options() -> PatchOptions {
        PatchOptions {
            backup: BackupPolicy::Disabled,
            ..PatchOptions::default()
        }
    }

    #[test]
    fn test_set_value_summary() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("my.cnf");
        fs::write(&file, "").unwrap();

        let line = set_value(options(), &file, Some("mysqld"), "port", "3306").unwrap();

        assert!(line.ends_with("port inserted at line 2 (new section)"));
        assert_eq!(fs::read_to_string(&file).unwrap(), "[mysqld]\nport = 3306\n");
    }

    #[test]
    fn test_set_value_dry_run() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("sshd_config");
        fs::write(&file, "#Port 22\n").unwrap();
        let options = PatchOptions {
            syntax: LineSyntax::Ssh,
            dry_run: true,
            ..options()
        };

        let line = set_value(options, &file, None, "Port", "2222").unwrap();

        assert!(line.contains("replaced line 1"));
        assert!(line.ends_with("(dry run)"));
        assert_eq!(fs::read_to_string(&file).unwrap(), "#Port 22\n");
    }

    #[test]
    fn test_set_value_error_names_key_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("missing.cnf");

        let err = set_value(options(), &file, None, "port", "1").unwrap_err();
        let message = format!("{err:#}");

        assert!(message.contains("'port'"));
        assert!(message.contains("missing.cnf"));
    }

    #[test]
    fn test_get_value() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("sysctl.conf");
        fs::write(&file, "vm.swappiness = 60\n").unwrap();

        assert_eq!(
            get_value(options(), &file, None, "vm.swappiness").unwrap(),
            Some("60".to_string())
        );
        assert_eq!(get_value(options(), &file, None, "fs.file-max").unwrap(), None);
    }
}
