//! Maven dependency coordinates.
//!
//! Accepted forms (the same short forms Aether understands):
//!
//! ```text
//! group:artifact:version
//! group:artifact:extension:version
//! group:artifact:extension:classifier:version
//! ```

use std::fmt;
use std::str::FromStr;

use crate::resolver::errors::ResolveError;

/// A `group:artifact:version` dependency identifier, possibly open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    group: String,
    artifact: String,
    extension: String,
    classifier: Option<String>,
    version: String,
}

impl Coordinate {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>, version: impl Into<String>) -> Self {
        Coordinate {
            group: group.into(),
            artifact: artifact.into(),
            extension: "jar".to_string(),
            classifier: None,
            version: version.into(),
        }
    }

    /// Parse a coordinate string.
    pub fn parse(s: &str) -> Result<Self, ResolveError> {
        let invalid = || ResolveError::InvalidCoordinate {
            coordinate: s.to_string(),
        };

        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid());
        }

        let (group, artifact, extension, classifier, version) = match parts.as_slice() {
            [g, a, v] => (*g, *a, "jar", None, *v),
            [g, a, e, v] => (*g, *a, *e, None, *v),
            [g, a, e, c, v] => (*g, *a, *e, Some(c.to_string()), *v),
            _ => return Err(invalid()),
        };

        Ok(Coordinate {
            group: group.to_string(),
            artifact: artifact.to_string(),
            extension: extension.to_string(),
            classifier,
            version: version.to_string(),
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// `group:artifact`, the identity used when the same library shows up
    /// at several places in a dependency graph.
    pub fn key(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }

    /// Whether the version is a plain version rather than a range or open marker.
    pub fn is_concrete(&self) -> bool {
        !self.version.ends_with('+')
            && !self.version.starts_with('[')
            && !self.version.starts_with('(')
    }

    pub fn with_version(&self, version: impl Into<String>) -> Self {
        Coordinate {
            version: version.into(),
            ..self.clone()
        }
    }

    pub fn with_classifier(&self, classifier: impl Into<String>) -> Self {
        Coordinate {
            classifier: Some(classifier.into()),
            ..self.clone()
        }
    }

    pub fn with_extension(&self, extension: impl Into<String>) -> Self {
        Coordinate {
            extension: extension.into(),
            classifier: None,
            ..self.clone()
        }
    }

    /// Repository-relative directory: `org/example/lib/1.0`.
    pub fn directory(&self) -> String {
        format!(
            "{}/{}/{}",
            self.group.replace('.', "/"),
            self.artifact,
            self.version
        )
    }

    /// Artifact file name: `lib-1.0[-classifier].jar`.
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact, self.version, classifier, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact, self.version, self.extension),
        }
    }

    /// Repository-relative path of the artifact file.
    pub fn repository_path(&self) -> String {
        format!("{}/{}", self.directory(), self.file_name())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

impl FromStr for Coordinate {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Coordinate::parse(s)
    }
}
