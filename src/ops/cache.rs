//! Remote include cache and build workspace maintenance.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::ops::environment::Environment;
use crate::sources::CacheEntry;
use crate::util::fs::remove_dir_all_if_exists;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Only remove includes fetched more than this many days ago
    pub older_than_days: Option<u64>,

    /// Also remove every build workspace
    pub builds: bool,
}

/// Cached remote includes, sorted by path.
pub fn list(env: &Environment) -> Result<Vec<CacheEntry>> {
    let remote = env.remote();
    remote
        .entries()
        .with_context(|| format!("failed to read cache directory: {}", remote.dir().display()))
}

/// Remove cached includes (and optionally build workspaces). Without an
/// explicit horizon the `[cache] max_age_days` setting applies; without
/// either, every cached include is removed.
pub fn clean(env: &Environment, opts: &CleanOptions, now_millis: i64) -> Result<Vec<PathBuf>> {
    let remote = env.remote();
    let horizon = opts.older_than_days.or(env.config().cache.max_age_days);

    let mut removed = match horizon {
        Some(days) => remote.evict_older_than(DAY * u32::try_from(days).unwrap_or(u32::MAX), now_millis),
        None => remote.evict_older_than(Duration::ZERO, i64::MAX),
    }
    .with_context(|| format!("failed to clean {}", remote.dir().display()))?;

    if opts.builds {
        let build_dir = env.ctx().build_dir();
        if build_dir.exists() {
            remove_dir_all_if_exists(&build_dir)?;
            removed.push(build_dir);
        }
    }
    Ok(removed)
}
