//! cfgpatch - Idempotent configuration patching for Linux hosts
//!
//! ## Commands
//!
//! - `cfgpatch set` - Set one key in one file
//! - `cfgpatch get` - Print the active value of a key
//! - `cfgpatch apply` - Apply a YAML/JSON patch plan
//! - `cfgpatch preset` - List, show and apply tuning presets
//! - `cfgpatch backup` / `cfgpatch restore` - Manual backups
//! - `cfgpatch completions` - Generate shell completions
//!
//! ## Installation
//!
//! ```bash
//! cargo install cfgpatch
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # Raise the MySQL connection limit
//! cfgpatch set /etc/mysql/my.cnf max_connections 500 --section mysqld
//!
//! # Disable SSH password logins
//! cfgpatch set /etc/ssh/sshd_config PasswordAuthentication no --syntax ssh
//!
//! # Preview a preset
//! cfgpatch preset apply ssh-hardening --dry-run
//! ```
//!
//! Services are not reloaded; restart them yourself after patching.

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if std::env::var("CFGPATCH_VERBOSE").is_ok() {
                eprintln!("{e:?}");
            }
            ExitCode::FAILURE
        }
    }
}
