//! Offer to create a missing script.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Make sure `file` exists before it is opened for editing.
///
/// With `assume_yes` the file is created silently. Otherwise the user is
/// asked until they answer yes or no. Returns `false` when they decline.
pub fn ensure_file_exists<R: BufRead, W: Write>(
    file: &Path,
    assume_yes: bool,
    input: R,
    mut out: W,
) -> Result<bool> {
    if file.exists() {
        return Ok(true);
    }
    if assume_yes {
        create(file)?;
        return Ok(true);
    }

    writeln!(
        out,
        "The file '{}' does not exist.  Do you wish to create it? [y/n]",
        file.display()
    )?;
    out.flush()?;

    for line in input.lines() {
        match line?.trim() {
            "y" | "Y" | "yes" | "YES" => {
                create(file)?;
                return Ok(true);
            }
            "n" | "N" | "no" | "NO" => return Ok(false),
            _ => {}
        }
    }
    Ok(false)
}

/// Prompt on the process' own standard streams.
pub fn ensure_file_exists_interactive(file: &Path, assume_yes: bool) -> Result<bool> {
    let stdin = io::stdin();
    ensure_file_exists(file, assume_yes, stdin.lock(), io::stdout())
}

fn create(file: &Path) -> Result<()> {
    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::File::create(file).with_context(|| format!("failed to create {}", file.display()))?;
    Ok(())
}
