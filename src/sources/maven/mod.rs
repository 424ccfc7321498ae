//! Maven artifact resolution.
//!
//! Artifacts are looked up in the local repository first, then in the
//! download area under `<home>/artifacts`, then in each search repository in
//! order. Downloads are written atomically using the standard repository
//! layout, so concurrent invocations never observe a partial jar.

pub mod pom;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rayon::prelude::*;

use crate::core::{Coordinate, Library, Repository};
use crate::resolver::errors::ResolveError;
use crate::resolver::version::resolve_version;
use crate::sources::http::HttpFetcher;
use crate::sources::{ArtifactResolver, VersionLister};
use crate::util::fs::write_atomic;
use crate::util::shell::{Shell, Status};

pub use pom::Pom;

/// Resolves coordinates against Maven-layout repositories.
pub struct MavenResolver {
    local_repository: PathBuf,
    artifact_dir: PathBuf,
    fetcher: Arc<dyn HttpFetcher>,
    shell: Arc<Shell>,
    offline: bool,
}

impl MavenResolver {
    pub fn new(
        local_repository: impl Into<PathBuf>,
        artifact_dir: impl Into<PathBuf>,
        fetcher: Arc<dyn HttpFetcher>,
        shell: Arc<Shell>,
    ) -> Self {
        MavenResolver {
            local_repository: local_repository.into(),
            artifact_dir: artifact_dir.into(),
            fetcher,
            shell,
            offline: false,
        }
    }

    /// Only use artifacts already on disk.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Find or download one artifact file.
    fn locate(&self, coordinate: &Coordinate, repositories: &[Repository]) -> Result<PathBuf, String> {
        let relative = coordinate.repository_path();

        for root in [&self.local_repository, &self.artifact_dir] {
            let candidate = root.join(&relative);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        let mut failures = Vec::new();
        for repo in repositories {
            if let Some(dir) = repo.local_dir() {
                let candidate = dir.join(&relative);
                if candidate.is_file() {
                    return Ok(candidate);
                }
                continue;
            }
            if self.offline {
                continue;
            }

            let url = repo.join(&relative);
            match self.fetcher.get(&url) {
                Ok(response) if response.is_success() => {
                    let dest = self.artifact_dir.join(&relative);
                    if let Some(parent) = dest.parent() {
                        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
                    }
                    write_atomic(&dest, &response.body).map_err(|e| e.to_string())?;
                    tracing::debug!("downloaded {} ({} bytes)", url, response.body.len());
                    return Ok(dest);
                }
                Ok(response) => failures.push(format!("{}: HTTP {}", repo.id(), response.status)),
                Err(e) => failures.push(format!("{}: {:#}", repo.id(), e)),
            }
        }

        if self.offline {
            failures.push("offline mode".to_string());
        }
        if failures.is_empty() {
            Err("no repository has it".to_string())
        } else {
            Err(format!("not found ({})", failures.join(", ")))
        }
    }

    fn load_pom(&self, coordinate: &Coordinate, repositories: &[Repository]) -> Option<Pom> {
        let path = self
            .locate(&coordinate.with_extension("pom"), repositories)
            .ok()?;
        let text = fs::read_to_string(&path).ok()?;
        match Pom::parse(&text) {
            Ok(pom) => Some(pom),
            Err(e) => {
                tracing::warn!("ignoring unreadable POM {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Depth-first walk of the runtime dependency graph; each
    /// `group:artifact` is visited once and the first version seen wins.
    fn collect(
        &self,
        coordinate: &Coordinate,
        repositories: &[Repository],
        seen: &mut HashSet<String>,
        out: &mut Vec<(Coordinate, PathBuf)>,
    ) -> Result<(), ResolveError> {
        if !seen.insert(coordinate.key()) {
            return Ok(());
        }

        let coordinate = resolve_version(coordinate, repositories, self)?;
        let pom = self.load_pom(&coordinate, repositories);

        match self.locate(&coordinate, repositories) {
            Ok(path) => {
                self.shell.verbose(format!("{} -> {}", coordinate, path.display()));
                out.push((coordinate.clone(), path));
            }
            Err(_) if pom.as_ref().is_some_and(Pom::is_aggregate) => {
                tracing::debug!("{} has pom packaging, no jar", coordinate);
            }
            Err(reason) => {
                return Err(ResolveError::ArtifactNotFound {
                    coordinate: coordinate.to_string(),
                    reason,
                })
            }
        }

        if let Some(pom) = pom {
            for dependency in pom.runtime_dependencies() {
                self.collect(&dependency, repositories, seen, out)?;
            }
        }
        Ok(())
    }

    fn secondary(&self, coordinate: &Coordinate, classifier: &str, repositories: &[Repository]) -> Option<PathBuf> {
        match self.locate(&coordinate.with_classifier(classifier), repositories) {
            Ok(path) => Some(path),
            Err(reason) => {
                tracing::debug!("no {} artifact for {}: {}", classifier, coordinate, reason);
                None
            }
        }
    }

    /// Versions found in one repository's metadata or directory listing.
    fn repository_versions(&self, repo: &Repository, relative_dir: &str) -> Vec<String> {
        if let Some(dir) = repo.local_dir() {
            return local_versions(&dir.join(relative_dir));
        }
        if self.offline {
            return Vec::new();
        }

        let url = repo.join(&format!("{}/maven-metadata.xml", relative_dir));
        match self.fetcher.get(&url) {
            Ok(response) if response.is_success() => {
                pom::metadata_versions(&response.text()).unwrap_or_else(|e| {
                    tracing::warn!("ignoring unreadable metadata {}: {}", url, e);
                    Vec::new()
                })
            }
            Ok(response) => {
                tracing::debug!("{} answered {}", url, response.status);
                Vec::new()
            }
            Err(e) => {
                tracing::debug!("{} failed: {:#}", url, e);
                Vec::new()
            }
        }
    }
}

/// Versions of an artifact in a local repository directory: the metadata
/// files if present, plus every version subdirectory.
fn local_versions(artifact_dir: &Path) -> Vec<String> {
    let mut versions = Vec::new();
    for name in ["maven-metadata-local.xml", "maven-metadata.xml"] {
        if let Ok(text) = fs::read_to_string(artifact_dir.join(name)) {
            versions.extend(pom::metadata_versions(&text).unwrap_or_default());
        }
    }
    if let Ok(entries) = fs::read_dir(artifact_dir) {
        let mut dirs: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        dirs.sort();
        versions.extend(dirs);
    }
    versions
}

impl VersionLister for MavenResolver {
    fn list_versions(
        &self,
        group: &str,
        artifact: &str,
        repositories: &[Repository],
    ) -> Result<Vec<String>, ResolveError> {
        let relative_dir = format!("{}/{}", group.replace('.', "/"), artifact);
        self.shell
            .status(Status::Resolving, format!("versions of {}:{}", group, artifact));

        let mut versions = local_versions(&self.local_repository.join(&relative_dir));
        versions.extend(local_versions(&self.artifact_dir.join(&relative_dir)));
        for repo in repositories {
            versions.extend(self.repository_versions(repo, &relative_dir));
        }

        let mut seen = HashSet::new();
        versions.retain(|v| seen.insert(v.clone()));
        Ok(versions)
    }
}

impl ArtifactResolver for MavenResolver {
    fn resolve_libraries(
        &self,
        coordinate: &Coordinate,
        repositories: &[Repository],
    ) -> Result<Vec<Library>, ResolveError> {
        let mut found = Vec::new();
        self.collect(coordinate, repositories, &mut HashSet::new(), &mut found)?;

        let progress = Mutex::new(self.shell.progress(found.len() as u64, "Downloading"));
        let libraries: Vec<Library> = found
            .par_iter()
            .map(|(coordinate, primary)| {
                let library = Library {
                    name: coordinate.to_string(),
                    primary: primary.clone(),
                    sources: self.secondary(coordinate, "sources", repositories),
                    javadoc: self.secondary(coordinate, "javadoc", repositories),
                };
                if let Ok(mut progress) = progress.lock() {
                    progress.inc(1);
                }
                library
            })
            .collect();

        if let Ok(progress) = progress.lock() {
            progress.finish();
        }
        Ok(libraries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{quiet_shell, MockHttp};
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn pom(group: &str, artifact: &str, version: &str, deps: &[(&str, &str, &str)]) -> String {
        let deps: String = deps
            .iter()
            .map(|(g, a, v)| {
                format!(
                    "<dependency><groupId>{}</groupId><artifactId>{}</artifactId><version>{}</version></dependency>",
                    g, a, v
                )
            })
            .collect();
        format!(
            "<project><groupId>{}</groupId><artifactId>{}</artifactId><version>{}</version><dependencies>{}</dependencies></project>",
            group, artifact, version, deps
        )
    }

    fn resolver(tmp: &TempDir, http: Arc<MockHttp>) -> MavenResolver {
        MavenResolver::new(
            tmp.path().join("m2"),
            tmp.path().join("artifacts"),
            http,
            Arc::new(quiet_shell()),
        )
    }

    #[test]
    fn test_local_repository_with_transitive_dependencies() {
        let tmp = TempDir::new().unwrap();
        let m2 = tmp.path().join("m2");
        write(&m2, "org/a/app/1.0/app-1.0.jar", "jar");
        write(&m2, "org/a/app/1.0/app-1.0.pom", &pom("org.a", "app", "1.0", &[("org.b", "lib", "2.0"), ("org.c", "util", "3.0")]));
        write(&m2, "org/b/lib/2.0/lib-2.0.jar", "jar");
        write(&m2, "org/b/lib/2.0/lib-2.0.pom", &pom("org.b", "lib", "2.0", &[("org.c", "util", "3.1")]));
        write(&m2, "org/c/util/3.1/util-3.1.jar", "jar");
        write(&m2, "org/c/util/3.0/util-3.0.jar", "jar");
        write(&m2, "org/a/app/1.0/app-1.0-sources.jar", "src");

        let http = Arc::new(MockHttp::new());
        let resolver = resolver(&tmp, http.clone()).offline(true);
        let libs = resolver
            .resolve_libraries(&Coordinate::parse("org.a:app:1.0").unwrap(), &[])
            .unwrap();

        let names: Vec<_> = libs.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["org.a:app:1.0", "org.b:lib:2.0", "org.c:util:3.1"]);
        assert!(libs[0].sources.is_some());
        assert!(libs[0].javadoc.is_none());
        assert_eq!(http.calls(), 0);
    }

    #[test]
    fn test_download_from_remote_repository() {
        let tmp = TempDir::new().unwrap();
        let http = Arc::new(MockHttp::new());
        http.respond("https://repo.example/org/x/lib/1.0/lib-1.0.jar", 200, "jar-bytes");
        let repos = vec![Repository::from_url("https://repo.example/")];

        let libs = resolver(&tmp, http.clone())
            .resolve_libraries(&Coordinate::parse("org.x:lib:1.0").unwrap(), &repos)
            .unwrap();

        assert_eq!(libs.len(), 1);
        assert_eq!(libs[0].primary, tmp.path().join("artifacts/org/x/lib/1.0/lib-1.0.jar"));
        assert_eq!(fs::read_to_string(&libs[0].primary).unwrap(), "jar-bytes");
    }

    #[test]
    fn test_missing_artifact_names_coordinate() {
        let tmp = TempDir::new().unwrap();
        let http = Arc::new(MockHttp::new());
        let repos = vec![Repository::from_url("https://repo.example/")];

        let err = resolver(&tmp, http)
            .resolve_libraries(&Coordinate::parse("org.x:gone:1.0").unwrap(), &repos)
            .unwrap_err();
        match err {
            ResolveError::ArtifactNotFound { coordinate, reason } => {
                assert_eq!(coordinate, "org.x:gone:1.0");
                assert!(reason.contains("404"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_list_versions_unions_repositories() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("m2"), "org/x/lib/1.3.0/lib-1.3.0.jar", "jar");
        let http = Arc::new(MockHttp::new());
        http.respond(
            "https://repo.example/org/x/lib/maven-metadata.xml",
            200,
            "<metadata><versioning><versions><version>1.2.0</version><version>1.3.0</version><version>1.3.5</version></versions></versioning></metadata>",
        );
        let repos = vec![Repository::from_url("https://repo.example")];

        let versions = resolver(&tmp, http)
            .list_versions("org.x", "lib", &repos)
            .unwrap();
        assert_eq!(versions, vec!["1.3.0", "1.2.0", "1.3.5"]);
    }
}
