//! Global context for Skate operations.
//!
//! Provides centralized access to the on-disk layout under the Skate home
//! directory (`$SKATE_HOME`, or `~/.skate`):
//!
//! ```text
//! ~/.skate/
//! ├── config.toml
//! ├── build/       per-script build workspaces
//! ├── project/     per-script IDE project workspaces
//! ├── cache/       remote includes
//! ├── stubs/       directive annotation declarations
//! └── artifacts/   downloaded Maven artifacts
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;

use crate::core::workspace::WorkspaceLayout;

/// Environment variable that relocates the Skate home directory.
pub const HOME_ENV: &str = "SKATE_HOME";

/// Global context containing paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global Skate data (~/.skate/)
    home: PathBuf,

    /// User home, used for the local Maven repository
    user_home: PathBuf,
}

impl GlobalContext {
    /// Create a new GlobalContext from the process environment.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let user_home = BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let home = match std::env::var_os(HOME_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => user_home.join(".skate"),
        };

        Ok(GlobalContext {
            cwd,
            home,
            user_home,
        })
    }

    /// Create a GlobalContext rooted at an explicit home directory.
    pub fn with_home(home: impl Into<PathBuf>) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.home = home.into();
        Ok(ctx)
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Root of per-script build workspaces.
    pub fn build_dir(&self) -> PathBuf {
        self.home.join("build")
    }

    /// Root of per-script project workspaces.
    pub fn project_dir(&self) -> PathBuf {
        self.home.join("project")
    }

    /// Remote include cache.
    pub fn cache_dir(&self) -> PathBuf {
        self.home.join("cache")
    }

    /// Directive annotation stub files.
    pub fn stub_dir(&self) -> PathBuf {
        self.home.join("stubs")
    }

    /// Downloaded Maven artifacts.
    pub fn artifact_dir(&self) -> PathBuf {
        self.home.join("artifacts")
    }

    /// Get the configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// The conventional local Maven repository.
    pub fn default_local_repository(&self) -> PathBuf {
        self.user_home.join(".m2").join("repository")
    }

    /// Workspace layout rooted in this context.
    pub fn workspace_layout(&self) -> WorkspaceLayout {
        WorkspaceLayout::new(self.build_dir(), self.project_dir())
    }

    /// Resolve a user-supplied path against the working directory.
    pub fn absolutize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}
