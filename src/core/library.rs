//! Resolved libraries.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A resolved dependency and the files backing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    /// `group:artifact:version`
    pub name: String,

    /// The main artifact, always present
    pub primary: PathBuf,

    /// `-sources` artifact, when the repository publishes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<PathBuf>,

    /// `-javadoc` artifact, when the repository publishes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub javadoc: Option<PathBuf>,
}

impl Library {
    pub fn new(name: impl Into<String>, primary: impl Into<PathBuf>) -> Self {
        Library {
            name: name.into(),
            primary: primary.into(),
            sources: None,
            javadoc: None,
        }
    }

    /// `group:artifact`, the identity used when merging library lists.
    pub fn key(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((key, _version)) if key.contains(':') => key,
            _ => &self.name,
        }
    }
}
