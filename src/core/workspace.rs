//! Deterministic per-script workspaces.
//!
//! Every script gets a build directory and a project directory named
//! `<stem>-<token>`, where the token is a radix-32 rendering of a stable hash
//! of the script's absolute path. The same path always maps to the same
//! directories, which lets the compiler skip work when nothing changed.
//! Nothing here touches the filesystem.

use std::path::{Path, PathBuf};

use crate::util::hash::path_token;

/// Build and project directories for one script.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkspacePaths {
    pub build_dir: PathBuf,
    pub project_dir: PathBuf,
}

impl WorkspacePaths {
    /// Where compiled classes go.
    pub fn output_dir(&self) -> PathBuf {
        self.build_dir.join("output")
    }

    /// Fingerprint of the last successful compilation.
    pub fn fingerprint_file(&self) -> PathBuf {
        self.build_dir.join("fingerprint.json")
    }
}

/// Roots under which workspaces are allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    build_root: PathBuf,
    project_root: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(build_root: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        WorkspaceLayout {
            build_root: build_root.into(),
            project_root: project_root.into(),
        }
    }

    /// Directory name for a script path.
    pub fn dir_name(absolute_file: &Path) -> String {
        let stem = absolute_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!(
            "{}-{}",
            stem,
            path_token(&absolute_file.to_string_lossy())
        )
    }

    /// Pure mapping from an absolute script path to its workspaces.
    pub fn paths(&self, absolute_file: &Path) -> WorkspacePaths {
        let name = Self::dir_name(absolute_file);
        WorkspacePaths {
            build_dir: self.build_root.join(&name),
            project_dir: self.project_root.join(&name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> WorkspaceLayout {
        WorkspaceLayout::new("/home/u/.skate/build", "/home/u/.skate/project")
    }

    #[test]
    fn test_same_path_same_directories() {
        let a = layout().paths(Path::new("/tmp/a/hello.kt"));
        let b = layout().paths(Path::new("/tmp/a/hello.kt"));
        assert_eq!(a, b);
        assert_eq!(a.build_dir, Path::new("/home/u/.skate/build/hello-16p9n16"));
        assert_eq!(a.project_dir, Path::new("/home/u/.skate/project/hello-16p9n16"));
    }

    #[test]
    fn test_shared_basename_different_directories() {
        let a = layout().paths(Path::new("/tmp/a/hello.kt"));
        let b = layout().paths(Path::new("/tmp/b/hello.kt"));
        assert_ne!(a.build_dir, b.build_dir);
        assert_ne!(a.project_dir, b.project_dir);
        assert_eq!(b.build_dir, Path::new("/home/u/.skate/build/hello-1ckmqo7"));
    }

    #[test]
    fn test_derived_files() {
        let paths = layout().paths(Path::new("/tmp/a/hello.kt"));
        assert_eq!(paths.output_dir(), paths.build_dir.join("output"));
        assert_eq!(paths.fingerprint_file(), paths.build_dir.join("fingerprint.json"));
    }

    #[test]
    fn test_does_not_create_directories() {
        let tmp = tempfile::TempDir::new().unwrap();
        let layout = WorkspaceLayout::new(tmp.path().join("build"), tmp.path().join("project"));
        let _ = layout.paths(Path::new("/tmp/a/hello.kt"));
        assert!(!tmp.path().join("build").exists());
    }
}
