//! Build fingerprinting for incremental builds.
//!
//! A fingerprint captures every input of a compilation: source contents,
//! library paths and the compiler identity. When the stored fingerprint
//! matches the current one and the output exists, compilation is skipped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::fs::write_atomic;
use crate::util::hash::{sha256_file, Fingerprint};

/// Inputs of one compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFingerprint {
    /// Source content hashes, keyed by path
    pub sources: BTreeMap<PathBuf, String>,

    /// Order of the source list matters to the compiler
    pub source_order: Vec<PathBuf>,

    /// Hash over library paths in classpath order
    pub libraries_hash: String,

    pub compiler: String,
}

impl BuildFingerprint {
    pub fn compute(sources: &[PathBuf], libraries: &[PathBuf], compiler: &str) -> Result<Self> {
        let mut hashes = BTreeMap::new();
        for source in sources {
            let hash = if source.exists() {
                sha256_file(source)?
            } else {
                "missing".to_string()
            };
            hashes.insert(source.clone(), hash);
        }

        let mut fp = Fingerprint::new();
        for library in libraries {
            fp.update_str(&library.to_string_lossy());
        }

        Ok(BuildFingerprint {
            sources: hashes,
            source_order: sources.to_vec(),
            libraries_hash: fp.finish(),
            compiler: compiler.to_string(),
        })
    }

    /// Stored fingerprint, if present and readable.
    pub fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(fingerprint) => Some(fingerprint),
            Err(e) => {
                tracing::debug!("ignoring unreadable fingerprint {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        write_atomic(path, content.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
