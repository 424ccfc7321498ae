//! Maven repositories searched during dependency resolution.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Maven Central.
pub const CENTRAL_URL: &str = "https://repo1.maven.org/maven2/";

/// Google's Maven repository.
pub const GOOGLE_URL: &str = "https://dl.google.com/dl/android/maven2/";

static ID_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[:/.]+").expect("valid separator regex"));

/// A remote or local repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    id: String,
    url: String,
}

impl Repository {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Repository {
            id: id.into(),
            url: url.into(),
        }
    }

    /// Repository declared by URL only; the id is derived from the URL.
    pub fn from_url(url: &str) -> Self {
        let url = url.trim();
        Repository {
            id: ID_SEPARATORS.replace_all(url, "_").into_owned(),
            url: url.to_string(),
        }
    }

    /// Repository backed by a local directory.
    pub fn local(id: impl Into<String>, dir: &Path) -> Self {
        let url = Url::from_directory_path(dir)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("file://{}", dir.display()));
        Repository::new(id, url)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Directory for `file://` repositories.
    pub fn local_dir(&self) -> Option<std::path::PathBuf> {
        let url = Url::parse(&self.url).ok()?;
        if url.scheme() != "file" {
            return None;
        }
        url.to_file_path().ok()
    }

    /// Absolute URL of a repository-relative path.
    pub fn join(&self, relative: &str) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), relative)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.url)
    }
}

/// The fixed default search set: Central, Google, the local repository, then
/// any configured extras.
pub fn default_repositories(local_repository: &Path, extra: &[String]) -> Vec<Repository> {
    let mut repos = vec![
        Repository::new("central", CENTRAL_URL),
        Repository::new("google", GOOGLE_URL),
        Repository::local("local", local_repository),
    ];
    repos.extend(extra.iter().map(|url| Repository::from_url(url)));
    repos
}

/// Concatenate repository lists, keeping the first occurrence of each URL.
pub fn merge_repositories<'a>(lists: impl IntoIterator<Item = &'a [Repository]>) -> Vec<Repository> {
    let mut merged: Vec<Repository> = Vec::new();
    for list in lists {
        for repo in list {
            let url = repo.url().trim_end_matches('/');
            if !merged.iter().any(|r| r.url().trim_end_matches('/') == url) {
                merged.push(repo.clone());
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_derives_id() {
        let repo = Repository::from_url("https://dl.bintray.com/lightningkite/com.lightningkite.kotlin");
        assert_eq!(
            repo.id(),
            "https_dl_bintray_com_lightningkite_com_lightningkite_kotlin"
        );
    }

    #[test]
    fn test_join() {
        let repo = Repository::new("central", CENTRAL_URL);
        assert_eq!(
            repo.join("org/x/y/1.0/y-1.0.jar"),
            "https://repo1.maven.org/maven2/org/x/y/1.0/y-1.0.jar"
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_local_repository_roundtrips_to_dir() {
        let repo = Repository::local("local", Path::new("/home/user/.m2/repository"));
        assert!(repo.url().starts_with("file:///home/user/.m2/repository"));
        assert_eq!(
            repo.local_dir().unwrap(),
            Path::new("/home/user/.m2/repository")
        );
        assert!(Repository::new("central", CENTRAL_URL).local_dir().is_none());
    }

    #[test]
    fn test_defaults_and_merge() {
        let defaults = default_repositories(Path::new("/m2"), &["https://example.org/extra".to_string()]);
        assert_eq!(defaults.len(), 4);
        assert_eq!(defaults[0].id(), "central");

        let declared = vec![
            Repository::from_url("https://example.org/repo"),
            Repository::from_url("https://repo1.maven.org/maven2"),
        ];
        let merged = merge_repositories([declared.as_slice(), defaults.as_slice()]);

        assert_eq!(merged[0].url(), "https://example.org/repo");
        // Central declared without trailing slash is not duplicated
        assert_eq!(merged.iter().filter(|r| r.url().contains("repo1.maven.org")).count(), 1);
        assert!(merged.iter().any(|r| r.id() == "google"));
        assert!(merged.iter().any(|r| r.id() == "local"));
    }
}
