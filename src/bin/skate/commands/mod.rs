//! Command implementations

pub mod cache;
pub mod completions;
pub mod run;
pub mod tree;

use std::sync::Arc;

use anyhow::Result;

use skate::ops::Environment;
use skate::util::{Config, GlobalContext, Shell};

use crate::cli::GlobalOpts;

/// Build the environment every command shares: home directory, config file
/// with environment overrides applied, then command-line flags on top.
pub fn environment(global: GlobalOpts) -> Result<Environment> {
    let ctx = GlobalContext::new()?;
    let mut config = Config::load_or_default(&ctx.config_path());
    config.apply_env(|key| std::env::var(key).ok());
    if global.offline {
        config.net.offline = true;
    }

    let shell = Arc::new(Shell::from_flags(global.quiet, global.verbose, global.color));
    Environment::new(ctx, config, shell)
}
