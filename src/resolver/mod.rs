//! Manifest graph resolution.
//!
//! A script and everything it includes are resolved into one
//! [`ResolvedUnit`]. Resolution is depth first in directive order, which
//! keeps the merged source and library lists stable for a given graph and
//! cache state. Includes currently being resolved are tracked on a stack, so
//! a file that includes itself, directly or through others, fails with
//! [`ResolveError::CyclicInclude`] instead of recursing forever.

pub mod errors;
pub mod version;

pub use errors::ResolveError;
pub use version::{resolve_version, MavenVersion, VersionRequirement};

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::core::manifest::IncludeRef;
use crate::core::repository::merge_repositories;
use crate::core::stubs::ensure_stub_file;
use crate::core::{Coordinate, Library, Manifest, Repository, ResolvedUnit, WorkspaceLayout};
use crate::sources::{ArtifactResolver, RemoteSourceCache, VersionLister};
use crate::util::shell::{Shell, Status};

/// Resolves scripts into units.
pub struct UnitResolver<'a> {
    remote: &'a RemoteSourceCache,
    artifacts: &'a dyn ArtifactResolver,
    versions: &'a dyn VersionLister,
    shell: &'a Shell,
    layout: WorkspaceLayout,
    stub_dir: PathBuf,
    default_repositories: Vec<Repository>,
    /// Implicit dependency of every file
    stdlib: Option<Coordinate>,
    /// Libraries already resolved in this pass, by concrete coordinate
    resolved: RefCell<HashMap<String, Vec<Library>>>,
}

impl<'a> UnitResolver<'a> {
    pub fn new(
        remote: &'a RemoteSourceCache,
        artifacts: &'a dyn ArtifactResolver,
        versions: &'a dyn VersionLister,
        shell: &'a Shell,
        layout: WorkspaceLayout,
        stub_dir: impl Into<PathBuf>,
    ) -> Self {
        UnitResolver {
            remote,
            artifacts,
            versions,
            shell,
            layout,
            stub_dir: stub_dir.into(),
            default_repositories: Vec::new(),
            stdlib: None,
            resolved: RefCell::new(HashMap::new()),
        }
    }

    /// Repositories searched after the ones declared by scripts.
    pub fn with_default_repositories(mut self, repositories: Vec<Repository>) -> Self {
        self.default_repositories = repositories;
        self
    }

    pub fn with_stdlib(mut self, stdlib: Option<Coordinate>) -> Self {
        self.stdlib = stdlib;
        self
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    /// Resolve a script and its include graph.
    pub fn resolve(&self, file: &Path) -> Result<ResolvedUnit, ResolveError> {
        let mut stack = Vec::new();
        self.resolve_file(file, &[], &mut stack)
    }

    /// Resolve an include reference relative to `base_dir`, with `lineage`
    /// as the repositories inherited from the including files.
    pub fn resolve_include(
        &self,
        reference: &str,
        base_dir: &Path,
        lineage: &[Repository],
    ) -> Result<ResolvedUnit, ResolveError> {
        let path = self.include_path(&IncludeRef::parse(reference), base_dir)?;
        self.resolve_file(&path, lineage, &mut Vec::new())
    }

    /// Resolve one dependency coordinate string into libraries.
    pub fn resolve_dependency(
        &self,
        coordinate: &str,
        repositories: &[Repository],
    ) -> Result<Vec<Library>, ResolveError> {
        let coordinate = Coordinate::parse(coordinate)?;
        self.resolve_coordinate(&coordinate, repositories)
    }

    /// Search set for a file: its own declarations, then inherited ones,
    /// then the defaults.
    pub fn search_repositories(&self, declared: &[Repository], lineage: &[Repository]) -> Vec<Repository> {
        merge_repositories([declared, lineage, self.default_repositories.as_slice()])
    }

    fn resolve_file(
        &self,
        file: &Path,
        lineage: &[Repository],
        stack: &mut Vec<PathBuf>,
    ) -> Result<ResolvedUnit, ResolveError> {
        let canonical = file
            .canonicalize()
            .map_err(|source| ResolveError::ManifestParse {
                path: file.to_path_buf(),
                source,
            })?;

        if let Some(start) = stack.iter().position(|p| *p == canonical) {
            let mut cycle = stack[start..].to_vec();
            cycle.push(canonical);
            return Err(ResolveError::CyclicInclude { cycle });
        }

        tracing::debug!("resolving {}", canonical.display());
        let manifest = Manifest::load(&canonical)?;

        let declared: Vec<Repository> = manifest
            .repositories()
            .iter()
            .map(|url| Repository::from_url(url))
            .collect();
        let repositories = self.search_repositories(&declared, lineage);

        let stub = ensure_stub_file(&self.stub_dir, manifest.package_name())
            .map_err(|e| ResolveError::io(&self.stub_dir, e))?;
        let libraries = self.resolve_manifest_dependencies(&manifest, &repositories)?;

        let child_lineage = merge_repositories([declared.as_slice(), lineage]);
        let base_dir = canonical
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        stack.push(canonical.clone());
        let mut includes = Vec::new();
        for include in manifest.includes() {
            let path = self.include_path(include, &base_dir)?;
            includes.push(self.resolve_file(&path, &child_lineage, stack)?);
        }
        stack.pop();

        let workspace = self.layout.paths(&canonical);
        Ok(ResolvedUnit::new(
            canonical,
            manifest,
            stub,
            libraries,
            repositories,
            includes,
            workspace,
        ))
    }

    fn include_path(&self, include: &IncludeRef, base_dir: &Path) -> Result<PathBuf, ResolveError> {
        match include {
            IncludeRef::Local(relative) => Ok(base_dir.join(relative)),
            IncludeRef::Remote(url) => self.remote.fetch(url, self.shell),
        }
    }

    fn resolve_manifest_dependencies(
        &self,
        manifest: &Manifest,
        repositories: &[Repository],
    ) -> Result<Vec<Library>, ResolveError> {
        let mut coordinates: Vec<Coordinate> = self.stdlib.iter().cloned().collect();
        for dependency in manifest.dependencies() {
            coordinates.push(Coordinate::parse(dependency)?);
        }

        let mut seen = HashSet::new();
        let mut libraries = Vec::new();
        for coordinate in &coordinates {
            for library in self.resolve_coordinate(coordinate, repositories)? {
                if seen.insert(library.key().to_string()) {
                    libraries.push(library);
                }
            }
        }
        Ok(libraries)
    }

    fn resolve_coordinate(
        &self,
        coordinate: &Coordinate,
        repositories: &[Repository],
    ) -> Result<Vec<Library>, ResolveError> {
        let concrete = resolve_version(coordinate, repositories, self.versions)?;
        if !concrete.is_concrete() {
            return Err(ResolveError::MalformedConstraint {
                coordinate: coordinate.to_string(),
            });
        }
        if concrete != *coordinate {
            self.shell
                .verbose(format!("{} resolved to {}", coordinate, concrete.version()));
        }

        let key = concrete.to_string();
        if let Some(libraries) = self.resolved.borrow().get(&key) {
            return Ok(libraries.clone());
        }

        self.shell.status(Status::Resolving, &concrete);
        let libraries = self.artifacts.resolve_libraries(&concrete, repositories)?;
        self.resolved.borrow_mut().insert(key, libraries.clone());
        Ok(libraries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::repository::default_repositories;
    use crate::test_support::{quiet_shell, MockHttp, StaticArtifacts};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        http: Arc<MockHttp>,
        remote: RemoteSourceCache,
        artifacts: StaticArtifacts,
        shell: Shell,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let http = Arc::new(MockHttp::new());
            let remote = RemoteSourceCache::new(tmp.path().join("cache"), http.clone());
            let artifacts = StaticArtifacts::new()
                .with_versions("org.jetbrains.kotlin:kotlin-stdlib", &["1.3.50"])
                .with_versions("org.x:lib", &["1.2.0", "1.3.0", "1.3.72", "1.4.0"]);
            Fixture {
                tmp,
                http,
                remote,
                artifacts,
                shell: quiet_shell(),
            }
        }

        fn write(&self, name: &str, text: &str) -> PathBuf {
            let path = self.tmp.path().join("scripts").join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, text).unwrap();
            path
        }

        fn resolver(&self) -> UnitResolver<'_> {
            UnitResolver::new(
                &self.remote,
                &self.artifacts,
                &self.artifacts,
                &self.shell,
                WorkspaceLayout::new(self.tmp.path().join("build"), self.tmp.path().join("project")),
                self.tmp.path().join("stubs"),
            )
            .with_default_repositories(default_repositories(&self.tmp.path().join("m2"), &[]))
            .with_stdlib(Some(Coordinate::parse("org.jetbrains.kotlin:kotlin-stdlib:1.3.50").unwrap()))
        }
    }

    fn file_names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_diamond_include_lists_shared_file_once() {
        let fx = Fixture::new();
        fx.write("d.kt", "package demo\nfun d() = 4\n");
        fx.write("b.kt", "package demo\n@file:Import(\"d.kt\")\n");
        fx.write("c.kt", "package demo\n@file:Import(\"./d.kt\")\n");
        let a = fx.write("a.kt", "package demo\n@file:Import(\"b.kt\")\n@file:Import(\"c.kt\")\nfun main() {}\n");

        let unit = fx.resolver().resolve(&a).unwrap();
        assert_eq!(
            file_names(&unit.sources()),
            vec!["a.kt", "FileAnnotations_demo.kt", "b.kt", "d.kt", "c.kt"]
        );
        assert_eq!(unit.libraries().len(), 1);
        assert_eq!(unit.main_class().as_deref(), Some("demo.AKt"));
    }

    #[test]
    fn test_cycle_is_named() {
        let fx = Fixture::new();
        fx.write("b.kt", "@file:Import(\"a.kt\")\n");
        let a = fx.write("a.kt", "@file:Import(\"b.kt\")\n");

        let err = fx.resolver().resolve(&a).unwrap_err();
        match err {
            ResolveError::CyclicInclude { cycle } => {
                assert_eq!(file_names(&cycle), vec!["a.kt", "b.kt", "a.kt"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_self_include_is_cycle() {
        let fx = Fixture::new();
        let a = fx.write("a.kt", "@file:Import(\"a.kt\")\n");
        assert!(matches!(
            fx.resolver().resolve(&a),
            Err(ResolveError::CyclicInclude { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_manifest_error() {
        let fx = Fixture::new();
        let err = fx
            .resolver()
            .resolve(&fx.tmp.path().join("nope.kt"))
            .unwrap_err();
        match err {
            ResolveError::ManifestParse { path, .. } => assert!(path.ends_with("nope.kt")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_insecure_include_rejected_without_network() {
        let fx = Fixture::new();
        let a = fx.write("a.kt", "@file:Import(\"http://example.com/helpers.kt\")\n");

        let err = fx.resolver().resolve(&a).unwrap_err();
        assert!(matches!(err, ResolveError::InsecureSource { ref url } if url == "http://example.com/helpers.kt"));
        assert_eq!(fx.http.calls(), 0);

        let err = fx
            .resolver()
            .resolve_include("http://example.com/helpers.kt", fx.tmp.path(), &[])
            .unwrap_err();
        assert!(matches!(err, ResolveError::InsecureSource { .. }));
        assert_eq!(fx.http.calls(), 0);
    }

    #[test]
    fn test_remote_include_goes_through_cache() {
        let fx = Fixture::new();
        fx.http.respond(
            "https://example.com/lib/helpers.kt",
            200,
            "@file:DependsOn(\"org.x:lib:1.3.0\")\nfun help() = 1\n",
        );
        let a = fx.write("a.kt", "@file:Import(\"https://example.com/lib/helpers.kt\")\n");

        let unit = fx.resolver().resolve(&a).unwrap();
        assert_eq!(
            file_names(&unit.sources()),
            vec!["a.kt", "FileAnnotations_default.kt", "helpers.kt"]
        );
        let names: Vec<_> = unit.libraries().into_iter().map(|l| l.name).collect();
        assert_eq!(
            names,
            vec!["org.jetbrains.kotlin:kotlin-stdlib:1.3.50", "org.x:lib:1.3.0"]
        );
        assert_eq!(fx.http.calls(), 1);
    }

    #[test]
    fn test_declared_repository_and_open_dependency() {
        let fx = Fixture::new();
        let a = fx.write(
            "a.kt",
            "@file:Repository(\"https://example.org/repo\")\n@file:DependsOn(\"org.x:lib:1.3.+\")\n",
        );

        let unit = fx.resolver().resolve(&a).unwrap();
        let names: Vec<_> = unit.libraries().into_iter().map(|l| l.name).collect();
        assert_eq!(
            names,
            vec!["org.jetbrains.kotlin:kotlin-stdlib:1.3.50", "org.x:lib:1.3.72"]
        );

        let urls: Vec<_> = unit.repositories().iter().map(|r| r.url().to_string()).collect();
        assert_eq!(urls[0], "https://example.org/repo");
        assert!(urls.iter().any(|u| u == crate::core::repository::CENTRAL_URL));
        assert!(urls.iter().any(|u| u == crate::core::repository::GOOGLE_URL));
        assert!(urls.iter().any(|u| u.starts_with("file://")));

        for request in fx.artifacts.requests() {
            assert!(!request.ends_with('+'), "open coordinate reached resolver: {request}");
        }
    }

    #[test]
    fn test_child_inherits_ancestor_repositories() {
        let fx = Fixture::new();
        fx.write("child.kt", "@file:Repository(\"https://child.example/m2\")\n");
        let a = fx.write(
            "a.kt",
            "@file:Repository(\"https://parent.example/m2\")\n@file:Import(\"child.kt\")\n",
        );

        let unit = fx.resolver().resolve(&a).unwrap();
        let child = &unit.includes()[0];
        let urls: Vec<_> = child.repositories().iter().map(|r| r.url()).collect();
        assert_eq!(urls[0], "https://child.example/m2");
        assert_eq!(urls[1], "https://parent.example/m2");
        assert!(!unit
            .repositories()
            .iter()
            .any(|r| r.url() == "https://child.example/m2"));
    }

    #[test]
    fn test_unresolvable_range_names_coordinate() {
        let fx = Fixture::new();
        let a = fx.write("a.kt", "@file:DependsOn(\"org.x:lib:2.0.+\")\n");
        let err = fx.resolver().resolve(&a).unwrap_err();
        match err {
            ResolveError::VersionResolution { coordinate, range } => {
                assert_eq!(coordinate, "org.x:lib:2.0.+");
                assert_eq!(range, "[2.0,2.1)");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_workspace_assigned_from_canonical_path() {
        let fx = Fixture::new();
        let a = fx.write("hello.kt", "fun main() {}\n");
        let unit = fx.resolver().resolve(&a).unwrap();
        let expected = fx.resolver().layout().paths(&a.canonicalize().unwrap());
        assert_eq!(unit.workspace(), &expected);
        assert!(unit
            .build_workspace()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("hello-"));
    }
}
