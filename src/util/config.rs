//! Configuration file support for Skate.
//!
//! Configuration lives in `<skate home>/config.toml`. A missing file means
//! defaults; an unreadable one logs a warning and also falls back to defaults.
//! A few settings can be overridden from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Kotlin standard library every script is compiled against.
pub const DEFAULT_STDLIB: &str = "org.jetbrains.kotlin:kotlin-stdlib:1.3.50";

/// Skate configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote source cache settings
    pub cache: CacheConfig,

    /// Network settings
    pub net: NetConfig,

    /// Dependency resolution settings
    pub maven: MavenConfig,

    /// External tool settings
    pub kotlin: KotlinConfig,
}

/// Remote source cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a fetched remote include stays fresh
    pub ttl_secs: u64,

    /// Entries older than this are removed by `skate cache clean`
    pub max_age_days: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_secs: 60 * 60,
            max_age_days: None,
        }
    }
}

/// Network-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Offline mode (don't fetch from network)
    pub offline: bool,
}

impl Default for NetConfig {
    fn default() -> Self {
        NetConfig {
            timeout_secs: 30,
            offline: false,
        }
    }
}

/// Dependency resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MavenConfig {
    /// Extra repositories searched after the ones a script declares
    pub repositories: Vec<String>,

    /// Local repository (defaults to ~/.m2/repository)
    pub local_repository: Option<PathBuf>,

    /// Implicit standard library coordinate
    pub stdlib: String,
}

impl Default for MavenConfig {
    fn default() -> Self {
        MavenConfig {
            repositories: Vec::new(),
            local_repository: None,
            stdlib: DEFAULT_STDLIB.to_string(),
        }
    }
}

/// External tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KotlinConfig {
    /// Kotlin compiler executable
    pub kotlinc: String,

    /// Java launcher executable
    pub java: String,

    /// Command used by `--edit` to open the generated project
    pub ide: Option<String>,
}

impl Default for KotlinConfig {
    fn default() -> Self {
        KotlinConfig {
            kotlinc: "kotlinc".to_string(),
            java: "java".to_string(),
            ide: None,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(value) = var("SKATE_OFFLINE") {
            self.net.offline = matches!(value.as_str(), "1" | "true" | "yes");
        }
        if let Some(value) = var("SKATE_KOTLINC") {
            self.kotlin.kotlinc = value;
        }
        if let Some(value) = var("SKATE_JAVA") {
            self.kotlin.java = value;
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.net.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.net.timeout_secs, 30);
        assert!(!config.net.offline);
        assert_eq!(config.maven.stdlib, DEFAULT_STDLIB);
        assert_eq!(config.kotlin.kotlinc, "kotlinc");
    }

    #[test]
    fn test_config_load_partial() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[cache]
ttl_secs = 60

[maven]
repositories = ["https://example.org/repo"]
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.ttl(), Duration::from_secs(60));
        assert_eq!(config.maven.repositories, vec!["https://example.org/repo"]);
        // Untouched sections keep their defaults
        assert_eq!(config.maven.stdlib, DEFAULT_STDLIB);
        assert_eq!(config.net.timeout_secs, 30);
    }

    #[test]
    fn test_load_or_default_on_invalid_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "this is [not toml").unwrap();

        let config = Config::load_or_default(&config_path);
        assert_eq!(config.cache.ttl_secs, 3600);
    }

    #[test]
    fn test_apply_env() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            "SKATE_OFFLINE" => Some("1".to_string()),
            "SKATE_JAVA" => Some("/opt/jdk/bin/java".to_string()),
            _ => None,
        });

        assert!(config.net.offline);
        assert_eq!(config.kotlin.java, "/opt/jdk/bin/java");
        assert_eq!(config.kotlin.kotlinc, "kotlinc");
    }
}
