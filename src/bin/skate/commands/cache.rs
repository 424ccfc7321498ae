//! `skate cache` command
//!
//! Inspect and prune the remote include cache.

use anyhow::Result;
use chrono::{TimeZone, Utc};

use skate::ops::{self, CleanOptions, Environment};
use skate::util::fs::{dir_size, format_size};
use skate::util::shell::Status;

use crate::cli::{CacheArgs, CacheCleanArgs, CacheCommands, GlobalOpts};

pub fn execute(global: GlobalOpts, args: CacheArgs) -> Result<i32> {
    let env = super::environment(global)?;
    match args.command {
        CacheCommands::List => list(&env)?,
        CacheCommands::Clean(clean_args) => clean(&env, clean_args)?,
        CacheCommands::Path => println!("{}", env.ctx().cache_dir().display()),
    }
    Ok(0)
}

fn list(env: &Environment) -> Result<()> {
    let entries = ops::list_cache(env)?;
    println!("Cache directory: {}", env.remote().dir().display());
    println!();

    if entries.is_empty() {
        println!("  (none)");
        return Ok(());
    }

    for entry in &entries {
        let fetched = entry
            .fetched_at
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let size = dir_size(&entry.path);
        println!("  {} ({}, fetched {})", entry.path.display(), format_size(size), fetched);
    }
    Ok(())
}

fn clean(env: &Environment, args: CacheCleanArgs) -> Result<()> {
    let opts = CleanOptions {
        older_than_days: args.older_than_days,
        builds: args.builds,
    };

    let removed = ops::clean_cache(env, &opts, Utc::now().timestamp_millis())?;
    for path in &removed {
        env.shell().status(Status::Removed, path.display());
    }
    if removed.is_empty() {
        env.shell().status(Status::Fresh, "nothing to remove");
    }
    Ok(())
}
