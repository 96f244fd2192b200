//! Built-in tuning presets
//!
//! Each preset is a typed module descriptor plus the assignments it applies
//! to one target file. Callers pick presets into an explicit [`Selection`],
//! which turns into an ordinary [`PatchPlan`].

use super::{Assignment, FileEntry, PatchPlan};
use crate::patcher::{ConfigKey, LineSyntax, PlanError, SectionHeader};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Area of the host a preset touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// MySQL / MariaDB server settings
    Database,
    /// OpenSSH daemon settings
    RemoteAccess,
    /// Kernel parameters via sysctl
    Kernel,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database => write!(f, "database"),
            Self::RemoteAccess => write!(f, "remote-access"),
            Self::Kernel => write!(f, "kernel"),
        }
    }
}

/// Describes a selectable preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    /// Display name
    pub name: &'static str,
    /// Identifier used on the command line
    pub flag: &'static str,
    /// Area of the host
    pub category: Category,
    /// One-line description
    pub description: &'static str,
}

/// A descriptor plus the assignments it applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preset {
    /// What the preset is
    pub descriptor: ModuleDescriptor,
    /// Absolute path of the file it patches
    pub target: &'static str,
    /// Line syntax of the target
    pub syntax: LineSyntax,
    /// Section receiving new assignments
    pub section: Option<&'static str>,
    /// Key/value pairs, applied in order
    pub assignments: &'static [(&'static str, &'static str)],
}

const MYSQLD_CNF: &str = "/etc/mysql/mysql.conf.d/mysqld.cnf";
const SSHD_CONFIG: &str = "/etc/ssh/sshd_config";
const SYSCTL_CONF: &str = "/etc/sysctl.conf";

/// All built-in presets
pub static PRESETS: &[Preset] = &[
    Preset {
        descriptor: ModuleDescriptor {
            name: "MySQL networking",
            flag: "mysql-network",
            category: Category::Database,
            description: "Listen on all interfaces and raise the connection limit",
        },
        target: MYSQLD_CNF,
        syntax: LineSyntax::Ini,
        section: Some("mysqld"),
        assignments: &[
            ("bind-address", "0.0.0.0"),
            ("port", "3306"),
            ("max_connections", "500"),
        ],
    },
    Preset {
        descriptor: ModuleDescriptor {
            name: "InnoDB tuning",
            flag: "mysql-innodb",
            category: Category::Database,
            description: "Buffer pool, redo log and flush settings for InnoDB",
        },
        target: MYSQLD_CNF,
        syntax: LineSyntax::Ini,
        section: Some("mysqld"),
        assignments: &[
            ("innodb_buffer_pool_size", "1G"),
            ("innodb_log_file_size", "256M"),
            ("innodb_flush_log_at_trx_commit", "1"),
            ("innodb_flush_method", "O_DIRECT"),
            ("innodb_file_per_table", "1"),
        ],
    },
    Preset {
        descriptor: ModuleDescriptor {
            name: "MySQL character set",
            flag: "mysql-charset",
            category: Category::Database,
            description: "Default to utf8mb4 for new schemas",
        },
        target: MYSQLD_CNF,
        syntax: LineSyntax::Ini,
        section: Some("mysqld"),
        assignments: &[
            ("character-set-server", "utf8mb4"),
            ("collation-server", "utf8mb4_unicode_ci"),
        ],
    },
    Preset {
        descriptor: ModuleDescriptor {
            name: "SSH hardening",
            flag: "ssh-hardening",
            category: Category::RemoteAccess,
            description: "Key-only logins, no root password login, fewer auth attempts",
        },
        target: SSHD_CONFIG,
        syntax: LineSyntax::Ssh,
        section: None,
        assignments: &[
            ("PermitRootLogin", "prohibit-password"),
            ("PasswordAuthentication", "no"),
            ("PubkeyAuthentication", "yes"),
            ("MaxAuthTries", "3"),
            ("X11Forwarding", "no"),
        ],
    },
    Preset {
        descriptor: ModuleDescriptor {
            name: "SSH keepalive",
            flag: "ssh-keepalive",
            category: Category::RemoteAccess,
            description: "Drop idle sessions after two missed keepalives",
        },
        target: SSHD_CONFIG,
        syntax: LineSyntax::Ssh,
        section: None,
        assignments: &[("ClientAliveInterval", "300"), ("ClientAliveCountMax", "2")],
    },
    Preset {
        descriptor: ModuleDescriptor {
            name: "Network stack tuning",
            flag: "sysctl-network",
            category: Category::Kernel,
            description: "Larger accept queues and faster TIME_WAIT recycling",
        },
        target: SYSCTL_CONF,
        syntax: LineSyntax::Ini,
        section: None,
        assignments: &[
            ("net.core.somaxconn", "65535"),
            ("net.ipv4.tcp_max_syn_backlog", "8192"),
            ("net.ipv4.tcp_fin_timeout", "15"),
            ("net.ipv4.tcp_tw_reuse", "1"),
            ("net.ipv4.ip_local_port_range", "1024 65535"),
        ],
    },
    Preset {
        descriptor: ModuleDescriptor {
            name: "Memory and file handles",
            flag: "sysctl-memory",
            category: Category::Kernel,
            description: "Less eager swapping, earlier writeback, more open files",
        },
        target: SYSCTL_CONF,
        syntax: LineSyntax::Ini,
        section: None,
        assignments: &[
            ("vm.swappiness", "10"),
            ("vm.dirty_ratio", "15"),
            ("vm.dirty_background_ratio", "5"),
            ("fs.file-max", "2097152"),
        ],
    },
];

/// Looks up a built-in preset by flag
#[must_use]
pub fn find_preset(flag: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.descriptor.flag == flag)
}

/// Error for a flag that names no built-in preset
#[must_use]
pub fn unknown_preset(flag: &str) -> PlanError {
    PlanError::UnknownPreset {
        flag: flag.to_string(),
        known: PRESETS
            .iter()
            .map(|p| p.descriptor.flag)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Presets chosen by the caller, with optional value overrides
///
/// # Example
///
/// ```rust
/// use cfgpatch::Selection;
///
/// let mut selection = Selection::new();
/// selection.select("mysql-network").unwrap();
/// selection.override_value("max_connections=1000").unwrap();
///
/// let plan = selection.to_plan().unwrap();
/// assert_eq!(plan.files.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Selection {
    presets: Vec<&'static Preset>,
    root: Option<PathBuf>,
    overrides: Vec<(ConfigKey, String)>,
}

impl Selection {
    /// Empty selection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the preset with `flag`; selecting twice has no effect
    ///
    /// # Errors
    ///
    /// Returns `PlanError::UnknownPreset` listing the valid flags.
    pub fn select(&mut self, flag: &str) -> Result<&mut Self, PlanError> {
        let preset = find_preset(flag).ok_or_else(|| unknown_preset(flag))?;

        if !self.presets.iter().any(|p| std::ptr::eq(*p, preset)) {
            self.presets.push(preset);
        }
        Ok(self)
    }

    /// Re-roots every absolute target under `root`
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Replaces the preset value of a key, given as `KEY=VALUE`
    ///
    /// # Errors
    ///
    /// Returns `PlanError::MalformedOverride` without `=`, or
    /// `PlanError::Patch` for an invalid key.
    pub fn override_value(&mut self, spec: &str) -> Result<&mut Self, PlanError> {
        let (key, value) = spec
            .split_once('=')
            .ok_or_else(|| PlanError::MalformedOverride(spec.to_string()))?;
        let key = ConfigKey::new(key.trim())?;
        let value = value.trim().to_string();

        self.overrides.retain(|(k, _)| k != &key);
        self.overrides.push((key, value));
        Ok(self)
    }

    /// Selected presets, in selection order
    #[must_use]
    pub fn presets(&self) -> &[&'static Preset] {
        &self.presets
    }

    /// Builds the plan, merging presets that share a target file
    ///
    /// # Errors
    ///
    /// Returns `PlanError::UnusedOverride` if an override matches no key of
    /// the selected presets.
    pub fn to_plan(&self) -> Result<PatchPlan, PlanError> {
        let mut plan = PatchPlan::default();
        let mut used = vec![false; self.overrides.len()];

        for preset in &self.presets {
            let path = self.resolve(preset.target);
            let section = preset.section.map(SectionHeader::new).transpose()?;

            let mut assignments = Vec::with_capacity(preset.assignments.len());
            for &(key, default) in preset.assignments {
                let value = match self.find_override(key, preset.syntax) {
                    Some(index) => {
                        used[index] = true;
                        self.overrides[index].1.clone()
                    }
                    None => default.to_string(),
                };
                assignments.push(Assignment::new(key, value)?);
            }

            let existing = plan.files.iter_mut().find(|f| {
                f.path == path && f.syntax == preset.syntax && f.section == section
            });
            match existing {
                Some(entry) => entry.set.extend(assignments),
                None => plan.files.push(FileEntry {
                    path,
                    syntax: preset.syntax,
                    section,
                    set: assignments,
                }),
            }
        }

        if let Some(index) = used.iter().position(|u| !u) {
            return Err(PlanError::UnusedOverride {
                key: self.overrides[index].0.to_string(),
            });
        }

        Ok(plan)
    }

    fn find_override(&self, key: &str, syntax: LineSyntax) -> Option<usize> {
        self.overrides.iter().position(|(k, _)| match syntax {
            LineSyntax::Ssh => k.as_str().eq_ignore_ascii_case(key),
            LineSyntax::Ini => k.as_str() == key,
        })
    }

    fn resolve(&self, target: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(target.trim_start_matches('/')),
            None => Path::new(target).to_path_buf(),
        }
    }
}
