//! CLI front end for cfgpatch
//!
//! Subcommands:
//! - `set`: Upsert one key in one file
//! - `get`: Print the active value of a key
//! - `apply`: Apply a YAML/JSON patch plan
//! - `preset`: List, show and apply built-in tuning presets
//! - `backup` / `restore`: Manual backup handling
//! - `completions`: Generate shell completions

pub mod apply;
pub mod backup;
pub mod completions;
pub mod preset;
pub mod set;

use anyhow::{Context, Result};
use cfgpatch::infrastructure::{Config, init_logging};
use cfgpatch::{BackupPolicy, LineSyntax, PatchOptions};
use clap::{Args as ClapArgs, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;
use std::process::ExitCode;

/// CLI arguments for cfgpatch
#[derive(Parser, Debug)]
#[command(name = "cfgpatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to $CFGPATCH_CONFIG or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set a key to a value, rewriting or inserting one line
    Set {
        /// Configuration file to patch
        file: PathBuf,
        /// Key to set
        key: String,
        /// Value to write
        value: String,
        /// Section for new assignments (`mysqld` or `[mysqld]`)
        #[arg(short, long)]
        section: Option<String>,
        /// Line syntax of the file
        #[arg(long, value_enum, default_value_t = LineSyntax::Ini)]
        syntax: LineSyntax,
        #[command(flatten)]
        flags: PatchFlags,
    },

    /// Print the active value of a key
    Get {
        /// Configuration file to read
        file: PathBuf,
        /// Key to look up
        key: String,
        /// Section to search when --scoped is given
        #[arg(short, long)]
        section: Option<String>,
        /// Line syntax of the file
        #[arg(long, value_enum, default_value_t = LineSyntax::Ini)]
        syntax: LineSyntax,
        /// Only search inside the section
        #[arg(long)]
        scoped: bool,
    },

    /// Apply a YAML or JSON patch plan
    Apply {
        /// Plan file
        plan: PathBuf,
        /// Report format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[command(flatten)]
        flags: PatchFlags,
    },

    /// Built-in tuning presets
    Preset {
        #[command(subcommand)]
        action: PresetCommand,
    },

    /// Take a timestamped backup of a file
    Backup {
        /// File to back up
        file: PathBuf,
        /// Backup directory (defaults to the configured one, then the file's directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Restore a file from a backup
    Restore {
        /// File to restore
        file: PathBuf,
        /// Backup to restore from (defaults to the latest one)
        #[arg(long)]
        from: Option<PathBuf>,
        /// Backup directory to search
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum PresetCommand {
    /// List available presets
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the assignments of a preset
    Show {
        /// Preset flag
        flag: String,
    },

    /// Apply one or more presets
    Apply {
        /// Preset flags
        #[arg(required = true)]
        flags: Vec<String>,
        /// Prefix for preset target paths (image or chroot builds)
        #[arg(long)]
        root: Option<PathBuf>,
        /// Override a preset value
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
        /// Report format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[command(flatten)]
        patch: PatchFlags,
    },
}

/// Flags shared by every mutating command
#[derive(ClapArgs, Debug, Clone, Default)]
struct PatchFlags {
    /// Fail when a key is assigned more than once
    #[arg(long)]
    strict: bool,
    /// Only match existing assignments inside the target section
    #[arg(long)]
    scoped: bool,
    /// Do not take a backup before writing
    #[arg(long)]
    no_backup: bool,
    /// Show what would change without writing
    #[arg(long)]
    dry_run: bool,
}

impl PatchFlags {
    fn merge(&self, mut options: PatchOptions) -> PatchOptions {
        options.strict |= self.strict;
        options.scoped |= self.scoped;
        options.dry_run = self.dry_run;
        if self.no_backup {
            options.backup = BackupPolicy::Disabled;
        }
        options
    }
}

/// Report output format
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable text
    Text,
    /// Pretty printed JSON
    Json,
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

/// Parse and execute CLI arguments
pub fn run() -> Result<ExitCode> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load cfgpatch config")?;

    let level = if args.verbose || std::env::var_os("CFGPATCH_DEBUG").is_some() {
        "debug".to_string()
    } else {
        std::env::var("CFGPATCH_LOG").unwrap_or_else(|_| config.log_level.clone())
    };
    init_logging(&level);

    match args.command {
        Command::Set {
            file,
            key,
            value,
            section,
            syntax,
            flags,
        } => {
            let mut options = flags.merge(config.patch_options());
            options.syntax = syntax;
            let line = set::set_value(options, &file, section.as_deref(), &key, &value)?;
            println!("{line}");
        }
        Command::Get {
            file,
            key,
            section,
            syntax,
            scoped,
        } => {
            let mut options = config.patch_options();
            options.syntax = syntax;
            options.scoped |= scoped;
            match set::get_value(options, &file, section.as_deref(), &key)? {
                Some(value) => println!("{value}"),
                None => {
                    tracing::debug!(key = %key, "Key not set");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Apply {
            plan,
            format,
            flags,
        } => {
            let options = flags.merge(config.patch_options());
            println!("{}", apply::apply_plan(&plan, options, format)?);
        }
        Command::Preset { action } => match action {
            PresetCommand::List { format } => {
                println!("{}", preset::list_presets(format)?);
            }
            PresetCommand::Show { flag } => {
                println!("{}", preset::show_preset(&flag)?);
            }
            PresetCommand::Apply {
                flags,
                root,
                overrides,
                format,
                patch,
            } => {
                let options = patch.merge(config.patch_options());
                let report =
                    preset::apply_presets(&flags, root, &overrides, options, format)?;
                println!("{report}");
            }
        },
        Command::Backup { file, dir } => {
            let dir = dir.or(config.backup_dir);
            let path = backup::backup_file(&file, dir.as_deref())?;
            println!("{}", path.display());
        }
        Command::Restore { file, from, dir } => {
            let dir = dir.or(config.backup_dir);
            let path = backup::restore_file(&file, from.as_deref(), dir.as_deref())?;
            println!("Restored {} from {}", file.display(), path.display());
        }
        Command::Completions { shell, output } => {
            completions::emit_completions(shell, output.as_deref())?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
