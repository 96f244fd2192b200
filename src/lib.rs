//! # cfgpatch - Idempotent host configuration patching
//!
//! cfgpatch sets `key = value` assignments in INI-style configuration files
//! (`my.cnf`, `sysctl.conf`) and `Key Value` assignments in sshd-style files
//! (`sshd_config`) without disturbing unrelated content. Running the same
//! upsert again leaves the file byte-identical.
//!
//! ## Quick Start
//!
//! ```rust
//! use cfgpatch::{ConfigPatcher, LineSyntax, PatchOptions};
//! use tempfile::TempDir;
//!
//! let temp_dir = TempDir::new().unwrap();
//! let sshd = temp_dir.path().join("sshd_config");
//! std::fs::write(&sshd, "#PermitRootLogin yes\n").unwrap();
//!
//! let patcher = ConfigPatcher::new(PatchOptions::with_syntax(LineSyntax::Ssh));
//! patcher.set_value(&sshd, None, "PermitRootLogin", "no").unwrap();
//!
//! assert_eq!(std::fs::read_to_string(&sshd).unwrap(), "PermitRootLogin no\n");
//! ```
//!
//! ## Features
//!
//! - **Upsert**: Rewrites the last matching line (active or commented) or
//!   inserts under the right `[section]`
//! - **Strict mode**: Refuses files that assign a key more than once
//! - **Backups**: One timestamped copy per file per session
//! - **Plans**: Ordered YAML/JSON lists of upserts
//! - **Presets**: Baseline MySQL, OpenSSH and sysctl tuning
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <https://www.apache.org/licenses/LICENSE-2.0>)
//! - MIT license ([LICENSE-MIT](LICENSE-MIT) or <https://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod infrastructure;
pub mod patcher;
pub mod plan;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use patcher::{
    BackupPolicy, ConfigDocument, ConfigKey, ConfigPatcher, LineSyntax, PatchError, PatchOptions,
    PatchOutcome, PatchSession, PlanError, SectionHeader, backup,
};
pub use plan::{
    Assignment, Category, FileEntry, ModuleDescriptor, PRESETS, PatchPlan, PlanReport, PlanStep,
    Preset, Selection, find_preset, unknown_preset,
};

/// Version of the cfgpatch crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
