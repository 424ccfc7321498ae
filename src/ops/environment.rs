//! Wiring of the collaborators every command needs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::builder::Kotlinc;
use crate::core::repository::default_repositories;
use crate::core::{Coordinate, Repository, ResolvedUnit};
use crate::resolver::UnitResolver;
use crate::sources::{HttpFetcher, MavenResolver, ReqwestFetcher, RemoteSourceCache};
use crate::util::process::find_tool;
use crate::util::shell::{Shell, Status};
use crate::util::{Config, GlobalContext};

/// Context, configuration, shell and the resolvers built from them.
pub struct Environment {
    ctx: GlobalContext,
    config: Config,
    shell: Arc<Shell>,
    fetcher: Arc<dyn HttpFetcher>,
    remote: RemoteSourceCache,
    maven: MavenResolver,
}

impl Environment {
    /// Environment using the real HTTP transport.
    pub fn new(ctx: GlobalContext, config: Config, shell: Arc<Shell>) -> Result<Self> {
        let fetcher: Arc<dyn HttpFetcher> = Arc::new(ReqwestFetcher::new(config.timeout())?);
        Ok(Self::with_fetcher(ctx, config, shell, fetcher))
    }

    pub fn with_fetcher(
        ctx: GlobalContext,
        config: Config,
        shell: Arc<Shell>,
        fetcher: Arc<dyn HttpFetcher>,
    ) -> Self {
        let offline = config.net.offline;
        let remote = RemoteSourceCache::new(ctx.cache_dir(), fetcher.clone())
            .with_ttl(config.ttl())
            .offline(offline);
        let local = config
            .maven
            .local_repository
            .clone()
            .unwrap_or_else(|| ctx.default_local_repository());
        let maven = MavenResolver::new(local, ctx.artifact_dir(), fetcher.clone(), shell.clone())
            .offline(offline);

        Environment {
            ctx,
            config,
            shell,
            fetcher,
            remote,
            maven,
        }
    }

    /// Same environment with status output silenced.
    pub fn quieted(&self) -> Environment {
        Self::with_fetcher(
            self.ctx.clone(),
            self.config.clone(),
            Arc::new(self.shell.quieted()),
            self.fetcher.clone(),
        )
    }

    pub fn ctx(&self) -> &GlobalContext {
        &self.ctx
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn remote(&self) -> &RemoteSourceCache {
        &self.remote
    }

    pub fn local_repository(&self) -> PathBuf {
        self.config
            .maven
            .local_repository
            .clone()
            .unwrap_or_else(|| self.ctx.default_local_repository())
    }

    pub fn default_repositories(&self) -> Vec<Repository> {
        default_repositories(&self.local_repository(), &self.config.maven.repositories)
    }

    /// Implicit standard library; an empty setting disables it.
    pub fn stdlib(&self) -> Result<Option<Coordinate>> {
        let stdlib = self.config.maven.stdlib.trim();
        if stdlib.is_empty() {
            return Ok(None);
        }
        Ok(Some(Coordinate::parse(stdlib)?))
    }

    pub fn resolver(&self) -> Result<UnitResolver<'_>> {
        Ok(UnitResolver::new(
            &self.remote,
            &self.maven,
            &self.maven,
            &self.shell,
            self.ctx.workspace_layout(),
            self.ctx.stub_dir(),
        )
        .with_default_repositories(self.default_repositories())
        .with_stdlib(self.stdlib()?))
    }

    /// Resolve a script given on the command line.
    pub fn resolve(&self, file: &Path) -> Result<ResolvedUnit> {
        let file = self.ctx.absolutize(file);
        self.shell.status(Status::Resolving, file.display());
        let unit = self.resolver()?.resolve(&file)?;
        tracing::debug!(
            "{} resolved: {} sources, {} libraries",
            file.display(),
            unit.sources().len(),
            unit.libraries().len()
        );
        Ok(unit)
    }

    pub fn kotlinc(&self) -> Result<Kotlinc> {
        Kotlinc::locate(&self.config.kotlin.kotlinc)
    }

    pub fn java(&self) -> Result<PathBuf> {
        find_tool(&self.config.kotlin.java, "JAVA_HOME").with_context(|| {
            format!(
                "could not find `{}`; install a JDK or set [kotlin] java in config.toml",
                self.config.kotlin.java
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockHttp;
    use tempfile::TempDir;

    fn env(tmp: &TempDir, config: Config) -> Environment {
        let ctx = GlobalContext::with_home(tmp.path().join("home")).unwrap();
        Environment::with_fetcher(
            ctx,
            config,
            Arc::new(crate::test_support::quiet_shell()),
            Arc::new(MockHttp::new()),
        )
    }

    #[test]
    fn test_configured_local_repository() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.maven.local_repository = Some(tmp.path().join("m2"));
        config.maven.repositories = vec!["https://extra.example/m2".to_string()];
        let env = env(&tmp, config);

        let repos = env.default_repositories();
        assert_eq!(repos[2].local_dir(), Some(tmp.path().join("m2")));
        assert_eq!(repos.last().unwrap().url(), "https://extra.example/m2");
    }

    #[test]
    fn test_stdlib_can_be_disabled() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        assert!(env(&tmp, config.clone()).stdlib().unwrap().is_some());

        config.maven.stdlib = String::new();
        assert!(env(&tmp, config).stdlib().unwrap().is_none());
    }
}
