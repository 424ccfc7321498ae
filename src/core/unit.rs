//! Resolved compilation units.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core::library::Library;
use crate::core::manifest::Manifest;
use crate::core::repository::Repository;
use crate::core::workspace::WorkspacePaths;

/// The merged closure of a script and everything it includes.
///
/// A unit is a snapshot of one resolution pass. It owns no external
/// resources; re-resolving the same file can produce a different unit when
/// directives or remote includes changed.
#[derive(Debug, Clone)]
pub struct ResolvedUnit {
    /// Canonical path of the script
    file: PathBuf,
    manifest: Manifest,
    /// Annotation stub for the script's package
    stub: PathBuf,
    /// Libraries resolved for this file's own coordinates
    own_libraries: Vec<Library>,
    /// Search repositories used for this file
    repositories: Vec<Repository>,
    includes: Vec<ResolvedUnit>,
    workspace: WorkspacePaths,
}

impl ResolvedUnit {
    pub fn new(
        file: PathBuf,
        manifest: Manifest,
        stub: PathBuf,
        own_libraries: Vec<Library>,
        repositories: Vec<Repository>,
        includes: Vec<ResolvedUnit>,
        workspace: WorkspacePaths,
    ) -> Self {
        ResolvedUnit {
            file,
            manifest,
            stub,
            own_libraries,
            repositories,
            includes,
            workspace,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn package_name(&self) -> Option<&str> {
        self.manifest.package_name()
    }

    pub fn has_main(&self) -> bool {
        self.manifest.has_main()
    }

    pub fn includes(&self) -> &[ResolvedUnit] {
        &self.includes
    }

    pub fn own_libraries(&self) -> &[Library] {
        &self.own_libraries
    }

    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    pub fn workspace(&self) -> &WorkspacePaths {
        &self.workspace
    }

    pub fn build_workspace(&self) -> &Path {
        &self.workspace.build_dir
    }

    pub fn project_workspace(&self) -> &Path {
        &self.workspace.project_dir
    }

    /// Self, then the package stub, then every include's sources; later
    /// duplicates dropped.
    pub fn sources(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_sources(&mut seen, &mut out);
        out
    }

    fn collect_sources(&self, seen: &mut HashSet<PathBuf>, out: &mut Vec<PathBuf>) {
        for path in [&self.file, &self.stub] {
            if seen.insert(path.clone()) {
                out.push(path.clone());
            }
        }
        for include in &self.includes {
            include.collect_sources(seen, out);
        }
    }

    /// Own libraries, then every include's libraries; the first occurrence of
    /// a `group:artifact` wins.
    pub fn libraries(&self) -> Vec<Library> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_libraries(&mut seen, &mut out);
        out
    }

    fn collect_libraries(&self, seen: &mut HashSet<String>, out: &mut Vec<Library>) {
        for lib in &self.own_libraries {
            if seen.insert(lib.key().to_string()) {
                out.push(lib.clone());
            }
        }
        for include in &self.includes {
            include.collect_libraries(seen, out);
        }
    }

    /// Declared imports plus a wildcard import of the unit's own package.
    pub fn auto_imports(&self) -> Vec<String> {
        let mut imports = self.manifest.imports().to_vec();
        if let Some(package) = self.package_name() {
            imports.push(format!("{}.*", package));
        }
        imports
    }

    /// Class holding the entry point, when the script declares one.
    pub fn main_class(&self) -> Option<String> {
        self.has_main().then(|| self.manifest.file_class_name())
    }
}
