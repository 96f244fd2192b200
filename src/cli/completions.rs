//! `cfgpatch completions` - Generate shell completions
//!
//! ```bash
//! cfgpatch completions bash > /etc/bash_completion.d/cfgpatch
//! cfgpatch completions zsh -o ~/.zsh/completion/_cfgpatch
//! ```

use anyhow::{Context, Result};
use clap_complete::Shell;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes the completion script for `shell` to `out`
pub fn write_completions(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = super::build_cli();
    let bin_name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, bin_name, out);
    out.flush().context("Failed to flush completions")
}

/// Writes the completion script to `output`, or stdout when unset
pub fn emit_completions(shell: Shell, output: Option<&Path>) -> Result<()> {
    let Some(path) = output else {
        return write_completions(shell, &mut io::stdout().lock());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to write completions to: {}", path.display()))?;
    write_completions(shell, &mut BufWriter::new(file))?;
    tracing::info!(shell = %shell, path = %path.display(), "Wrote completions");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn script(shell: Shell) -> String {
        let mut buf = Vec::new();
        write_completions(shell, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_bash_completions_cover_subcommands() {
        let bash = script(Shell::Bash);
        assert!(bash.contains("cfgpatch"));
        assert!(bash.contains("preset"));
        assert!(bash.contains("restore"));
    }

    #[test]
    fn test_fish_completions() {
        assert!(script(Shell::Fish).contains("cfgpatch"));
    }

    #[test]
    fn test_emit_to_nested_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("zsh").join("_cfgpatch");

        emit_completions(Shell::Zsh, Some(&path)).unwrap();

        assert!(fs::read_to_string(&path).unwrap().contains("cfgpatch"));
    }
}
