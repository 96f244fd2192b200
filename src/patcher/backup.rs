//! Timestamped backups of configuration files
//!
//! A backup is a read-only copy named `<file>.bak.<YYYYmmdd_HHMMSS>`, placed
//! next to the original or in a configured backup directory. Backups are
//! never removed by this crate; restoring is a manual operation.

use super::errors::PatchError;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

const BACKUP_MARKER: &str = ".bak.";

/// Copies `file` to a new timestamped backup and returns its path
///
/// # Arguments
///
/// * `file` - Configuration file to back up
/// * `dir` - Backup directory; `None` places the backup next to `file`
///
/// # Errors
///
/// Returns `PatchError::FileNotFound` if `file` is missing and
/// `PatchError::Backup` if the copy cannot be written.
pub fn create_backup(file: &Path, dir: Option<&Path>) -> Result<PathBuf, PatchError> {
    if !file.is_file() {
        return Err(PatchError::FileNotFound {
            path: file.to_path_buf(),
        });
    }

    let backup_dir = backup_dir_for(file, dir);
    fs::create_dir_all(&backup_dir).map_err(|e| backup_error(file, &e))?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let base = format!("{}{BACKUP_MARKER}{stamp}", file_name(file));
    let mut target = backup_dir.join(&base);
    let mut counter = 1;
    while target.exists() {
        target = backup_dir.join(format!("{base}.{counter}"));
        counter += 1;
    }

    fs::copy(file, &target).map_err(|e| backup_error(file, &e))?;

    let mut permissions = fs::metadata(&target)
        .map_err(|e| backup_error(file, &e))?
        .permissions();
    permissions.set_readonly(true);
    fs::set_permissions(&target, permissions).map_err(|e| backup_error(file, &e))?;

    tracing::info!(file = %file.display(), backup = %target.display(), "Created backup");
    Ok(target)
}

/// Lists existing backups of `file`, oldest first
///
/// # Errors
///
/// Returns `PatchError::Backup` if the backup directory cannot be read.
/// A missing backup directory yields an empty list.
pub fn list_backups(file: &Path, dir: Option<&Path>) -> Result<Vec<PathBuf>, PatchError> {
    let backup_dir = backup_dir_for(file, dir);
    if !backup_dir.is_dir() {
        return Ok(Vec::new());
    }

    let prefix = format!("{}{BACKUP_MARKER}", file_name(file));
    let entries = fs::read_dir(&backup_dir).map_err(|e| backup_error(file, &e))?;

    let mut backups: Vec<(BackupStamp, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let stamp = BackupStamp::parse(name.strip_prefix(&prefix)?);
            Some((stamp, entry.path()))
        })
        .collect();
    backups.sort();

    Ok(backups.into_iter().map(|(_, path)| path).collect())
}

/// Most recent backup of `file`, if any
///
/// # Errors
///
/// See [`list_backups`].
pub fn latest_backup(file: &Path, dir: Option<&Path>) -> Result<Option<PathBuf>, PatchError> {
    Ok(list_backups(file, dir)?.pop())
}

/// Overwrites `file` with the content of `backup`
///
/// The target keeps its own permissions; the backup is left in place.
///
/// # Errors
///
/// Returns `PatchError::FileNotFound` if the backup is missing,
/// `PatchError::PermissionDenied` if the target is not writable and
/// `PatchError::Backup` for other I/O failures.
pub fn restore_backup(backup: &Path, file: &Path) -> Result<(), PatchError> {
    let content = fs::read(backup).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PatchError::FileNotFound {
            path: backup.to_path_buf(),
        },
        _ => backup_error(file, &e),
    })?;

    fs::write(file, content).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => PatchError::PermissionDenied {
            path: file.to_path_buf(),
        },
        _ => backup_error(file, &e),
    })?;

    tracing::info!(file = %file.display(), backup = %backup.display(), "Restored backup");
    Ok(())
}

/// Sort key of a backup name: timestamp, then collision counter
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct BackupStamp {
    time: String,
    counter: u32,
}

impl BackupStamp {
    /// Parses `YYYYmmdd_HHMMSS` or `YYYYmmdd_HHMMSS.N`
    fn parse(suffix: &str) -> Self {
        if let Some((time, counter)) = suffix.rsplit_once('.') {
            if let Ok(counter) = counter.parse() {
                return Self {
                    time: time.to_string(),
                    counter,
                };
            }
        }
        Self {
            time: suffix.to_string(),
            counter: 0,
        }
    }
}

fn backup_dir_for(file: &Path, dir: Option<&Path>) -> PathBuf {
    match dir {
        Some(dir) => dir.to_path_buf(),
        None => file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
    }
}

fn file_name(file: &Path) -> String {
    file.file_name()
        .map_or_else(|| "config".to_string(), |n| n.to_string_lossy().into_owned())
}

fn backup_error(file: &Path, err: &std::io::Error) -> PatchError {
    PatchError::Backup {
        path: file.to_path_buf(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_backup_next_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("my.cnf");
        fs::write(&file, "[mysqld]\n").unwrap();

        let backup = create_backup(&file, None).unwrap();

        assert_eq!(backup.parent(), Some(temp_dir.path()));
        assert!(
            backup
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("my.cnf.bak.")
        );
        assert_eq!(fs::read_to_string(&backup).unwrap(), "[mysqld]\n");
        assert!(fs::metadata(&backup).unwrap().permissions().readonly());
    }

    #[test]
    fn test_backups_in_same_second_do_not_collide() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("sshd_config");
        fs::write(&file, "Port 22\n").unwrap();

        let first = create_backup(&file, None).unwrap();
        let second = create_backup(&file, None).unwrap();

        assert_ne!(first, second);
        assert_eq!(list_backups(&file, None).unwrap().len(), 2);
    }

    #[test]
    fn test_latest_backup_after_many_collisions() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("my.cnf");
        fs::write(&file, "port = 3306\n").unwrap();

        let mut last = None;
        for _ in 0..12 {
            last = Some(create_backup(&file, None).unwrap());
        }

        assert_eq!(list_backups(&file, None).unwrap().len(), 12);
        assert_eq!(latest_backup(&file, None).unwrap(), last);
    }

    #[test]
    fn test_list_orders_counter_numerically() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("my.cnf");
        fs::write(&file, "").unwrap();
        let names = [
            "my.cnf.bak.20240101_000000",
            "my.cnf.bak.20240101_000000.2",
            "my.cnf.bak.20240101_000000.9",
            "my.cnf.bak.20240101_000000.10",
            "my.cnf.bak.20240101_000000.11",
            "my.cnf.bak.20240101_000001",
        ];
        for name in names.iter().rev() {
            fs::write(temp_dir.path().join(name), "").unwrap();
        }

        let listed: Vec<_> = list_backups(&file, None)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(listed, names);
    }

    #[test]
    fn test_create_backup_in_custom_dir() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("sysctl.conf");
        let dir = temp_dir.path().join("backups");
        fs::write(&file, "vm.swappiness = 60\n").unwrap();

        let backup = create_backup(&file, Some(&dir)).unwrap();

        assert_eq!(backup.parent(), Some(dir.as_path()));
        assert_eq!(latest_backup(&file, Some(&dir)).unwrap(), Some(backup));
        assert!(list_backups(&file, None).unwrap().is_empty());
    }

    #[test]
    fn test_create_backup_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("absent.cnf");
        assert_eq!(
            create_backup(&file, None),
            Err(PatchError::FileNotFound { path: file })
        );
    }

    #[test]
    fn test_restore_backup() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("my.cnf");
        fs::write(&file, "port = 3306\n").unwrap();
        let backup = create_backup(&file, None).unwrap();

        fs::write(&file, "port = 9999\n").unwrap();
        restore_backup(&backup, &file).unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "port = 3306\n");
        assert!(!fs::metadata(&file).unwrap().permissions().readonly());
    }

    #[test]
    fn test_list_ignores_other_files() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("my.cnf");
        fs::write(&file, "").unwrap();
        fs::write(temp_dir.path().join("other.cnf.bak.20240101_000000"), "").unwrap();

        assert!(list_backups(&file, None).unwrap().is_empty());
    }
}
