//! Implementation of `--project` and `--edit`.
//!
//! The project workspace gets a `src/` directory of links to every source
//! of the unit and a `skate-project.json` describing sources, libraries and
//! the entry point. Generating IDE-specific files is left to the IDE.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::{Library, ResolvedUnit};
use crate::ops::environment::Environment;
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists, symlink, write_atomic};
use crate::util::process::ProcessBuilder;
use crate::util::shell::Status;

pub const DESCRIPTOR_FILE: &str = "skate-project.json";

/// Contents of `skate-project.json`.
#[derive(Debug, Serialize)]
pub struct ProjectDescriptor<'a> {
    pub script: &'a Path,
    pub main_class: Option<String>,
    pub sources: Vec<PathBuf>,
    pub libraries: Vec<Library>,
    pub auto_imports: Vec<String>,
    pub build_dir: &'a Path,
}

/// Recreate the project workspace of a unit; returns its directory.
pub fn write_project(unit: &ResolvedUnit) -> Result<PathBuf> {
    let folder = unit.project_workspace().to_path_buf();
    remove_dir_all_if_exists(&folder)?;
    let src = folder.join("src");
    ensure_dir(&src)?;

    let sources = unit.sources();
    let mut taken = HashSet::new();
    for source in &sources {
        let link = src.join(link_name(source, &mut taken));
        symlink(source, &link)
            .with_context(|| format!("failed to link {} into {}", source.display(), src.display()))?;
    }

    let descriptor = ProjectDescriptor {
        script: unit.file(),
        main_class: unit.main_class(),
        sources,
        libraries: unit.libraries(),
        auto_imports: unit.auto_imports(),
        build_dir: unit.build_workspace(),
    };
    let json = serde_json::to_string_pretty(&descriptor)?;
    let path = folder.join(DESCRIPTOR_FILE);
    write_atomic(&path, json.as_bytes()).with_context(|| format!("failed to write {}", path.display()))?;

    Ok(folder)
}

/// File name for a linked source; clashing names get a numeric suffix
/// starting at 2.
fn link_name(source: &Path, taken: &mut HashSet<String>) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut name = format!("{}{}", stem, extension);
    let mut n = 2;
    while !taken.insert(name.clone()) {
        name = format!("{}{}{}", stem, n, extension);
        n += 1;
    }
    name
}

/// Resolve `file` and regenerate its project workspace.
pub fn project(env: &Environment, file: &Path) -> Result<PathBuf> {
    let unit = env.resolve(file)?;
    let folder = write_project(&unit)?;
    env.shell().status(Status::Created, format!("project at {}", folder.display()));
    Ok(folder)
}

/// Regenerate the project workspace and open it in the configured IDE.
pub fn edit(env: &Environment, file: &Path) -> Result<PathBuf> {
    let folder = project(env, file)?;
    let Some(ide) = env.config().kotlin.ide.clone() else {
        env.shell().warn("no IDE configured; set `ide` under [kotlin] in config.toml");
        return Ok(folder);
    };

    let script_link = folder.join("src").join(file.file_name().unwrap_or_default());
    ProcessBuilder::new(&ide)
        .arg(&folder)
        .arg(&script_link)
        .status()
        .with_context(|| format!("failed to launch `{}`", ide))?;
    Ok(folder)
}
