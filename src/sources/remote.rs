//! Remote source cache.
//!
//! Included files hosted on the web are downloaded into `<home>/cache`. The
//! fetch time is stored inside the cached file itself, on a sentinel comment
//! line, so staleness can be judged by reading the file alone:
//!
//! ```text
//! //Imported by Skate at Oct 17, 2026, 9:41:07 AM
//! //System.currentTimeMillis() == 1792230067000
//! <body>
//! ```
//!
//! Fresh entries are served without touching the network. Stale entries are
//! refreshed; when the refresh fails the stale copy is served with a warning.
//!
//! The cache file is named after the last URL segment only. Two URLs ending
//! in the same file name share one cache entry, so within the TTL the second
//! include is served the first one's body.

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use url::Url;

use crate::resolver::errors::ResolveError;
use crate::sources::http::HttpFetcher;
use crate::util::fs::write_atomic;
use crate::util::shell::{Shell, Status};

/// Default time-to-live of a cached include.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

const IMPORTED_PREFIX: &str = "//Imported by Skate at ";
const FETCHED_AT_PREFIX: &str = "//System.currentTimeMillis() == ";

/// A cached include file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: PathBuf,
    /// Embedded fetch time in epoch milliseconds, if the marker is readable.
    pub fetched_at: Option<i64>,
}

/// Disk cache for remotely included source files.
pub struct RemoteSourceCache {
    dir: PathBuf,
    fetcher: Arc<dyn HttpFetcher>,
    ttl: Duration,
    offline: bool,
}

impl RemoteSourceCache {
    pub fn new(dir: impl Into<PathBuf>, fetcher: Arc<dyn HttpFetcher>) -> Self {
        RemoteSourceCache {
            dir: dir.into(),
            fetcher,
            ttl: DEFAULT_TTL,
            offline: false,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Never touch the network; cached copies of any age are served.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reject anything not served over https. Runs before any I/O.
    pub fn check_secure(url: &str) -> Result<Url, ResolveError> {
        match Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "https" => Ok(parsed),
            Err(e) if url.starts_with("https://") => Err(ResolveError::RemoteFetch {
                url: url.to_string(),
                reason: format!("invalid URL: {}", e),
            }),
            _ => Err(ResolveError::InsecureSource {
                url: url.to_string(),
            }),
        }
    }

    /// File name for a URL: its last path segment reduced to identifier
    /// characters, with any `kt` suffix replaced by `.kt`.
    pub fn cache_key(url: &str) -> String {
        let segment = url.rsplit('/').next().unwrap_or(url);
        let filtered: String = segment
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
            .collect();
        let stem = filtered.strip_suffix("kt").unwrap_or(&filtered);
        format!("{}.kt", stem)
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(Self::cache_key(url))
    }

    /// Local copy of `url`, fetching it when missing or stale.
    pub fn fetch(&self, url: &str, shell: &Shell) -> Result<PathBuf, ResolveError> {
        self.fetch_at(url, shell, Utc::now().timestamp_millis())
    }

    /// Same as [`fetch`](Self::fetch) with an explicit clock.
    pub fn fetch_at(&self, url: &str, shell: &Shell, now_millis: i64) -> Result<PathBuf, ResolveError> {
        Self::check_secure(url)?;

        let path = self.path_for(url);
        if path.exists() {
            let fetched_at = read_fetched_at(&path).unwrap_or(0);
            let fresh = now_millis < fetched_at.saturating_add(self.ttl.as_millis() as i64);
            if fresh || self.offline {
                tracing::debug!("using cached {} ({})", url, path.display());
                shell.status(Status::Fresh, format!("cached {}", url));
                return Ok(path);
            }
        } else if self.offline {
            return Err(ResolveError::RemoteFetch {
                url: url.to_string(),
                reason: "offline mode and no cached copy".to_string(),
            });
        }

        shell.status(Status::Fetching, url);
        let reason = match self.fetcher.get(url) {
            Ok(response) if response.is_success() => {
                self.store(&path, &response.body, now_millis)?;
                return Ok(path);
            }
            Ok(response) => format!("got HTTP status {}", response.status),
            Err(e) => format!("{:#}", e),
        };

        if path.exists() {
            tracing::warn!("could not refresh {}: {}", url, reason);
            shell.warn(format!(
                "could not reload `{}` ({}), using cached copy",
                url, reason
            ));
            return Ok(path);
        }

        Err(ResolveError::RemoteFetch {
            url: url.to_string(),
            reason,
        })
    }

    fn store(&self, path: &Path, body: &[u8], now_millis: i64) -> Result<(), ResolveError> {
        fs::create_dir_all(&self.dir).map_err(|e| ResolveError::io(&self.dir, e))?;

        let mut contents = format!(
            "{}{}\n{}{}\n",
            IMPORTED_PREFIX,
            format_date(now_millis),
            FETCHED_AT_PREFIX,
            now_millis
        )
        .into_bytes();
        contents.extend_from_slice(body);

        write_atomic(path, &contents).map_err(|e| ResolveError::io(path, e))?;
        tracing::debug!("cached {} bytes at {}", body.len(), path.display());
        Ok(())
    }

    /// Every cached file, sorted by path.
    pub fn entries(&self) -> io::Result<Vec<CacheEntry>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "kt") {
                entries.push(CacheEntry {
                    fetched_at: read_fetched_at(&path),
                    path,
                });
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Remove entries fetched more than `age` before `now_millis`, including
    /// entries without a readable timestamp. Returns the removed paths.
    pub fn evict_older_than(&self, age: Duration, now_millis: i64) -> io::Result<Vec<PathBuf>> {
        let horizon = now_millis.saturating_sub(age.as_millis() as i64);
        let mut removed = Vec::new();

        for entry in self.entries()? {
            if entry.fetched_at.map_or(true, |t| t < horizon) {
                fs::remove_file(&entry.path)?;
                removed.push(entry.path);
            }
        }
        Ok(removed)
    }
}

/// Embedded fetch time of a cached file.
pub fn read_fetched_at(path: &Path) -> Option<i64> {
    let file = fs::File::open(path).ok()?;
    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .find_map(|line| {
            line.strip_prefix(FETCHED_AT_PREFIX)
                .and_then(|rest| rest.trim().parse().ok())
        })
}

fn format_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|utc| {
            utc.with_timezone(&Local)
                .format("%b %-d, %Y, %-I:%M:%S %p")
                .to_string()
        })
        .unwrap_or_default()
}
