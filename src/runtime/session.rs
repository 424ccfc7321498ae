//! Loading sessions.

use std::path::{Path, PathBuf};

use crate::core::ResolvedUnit;
use crate::util::process::join_classpath;

/// Ordered, deduplicated classpath plus the imports applied to evaluated
/// lines. Owned by whoever runs the unit and extended in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadingSession {
    classpath: Vec<PathBuf>,
    auto_imports: Vec<String>,
}

impl LoadingSession {
    pub fn new() -> Self {
        LoadingSession::default()
    }

    /// Session for a compiled unit: its libraries, then its compiled output.
    pub fn for_unit(unit: &ResolvedUnit, output: &Path) -> Self {
        let mut session = LoadingSession::new();
        session.extend(unit.libraries().into_iter().map(|lib| lib.primary));
        session.extend([output.to_path_buf()]);
        session.add_imports(unit.auto_imports());
        session
    }

    /// Append entries not already present; returns how many were added.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = PathBuf>) -> usize {
        let before = self.classpath.len();
        for entry in entries {
            if !self.classpath.contains(&entry) {
                self.classpath.push(entry);
            }
        }
        self.classpath.len() - before
    }

    pub fn add_imports(&mut self, imports: impl IntoIterator<Item = String>) {
        for import in imports {
            if !self.auto_imports.contains(&import) {
                self.auto_imports.push(import);
            }
        }
    }

    pub fn classpath(&self) -> &[PathBuf] {
        &self.classpath
    }

    pub fn auto_imports(&self) -> &[String] {
        &self.auto_imports
    }

    /// Platform-separated classpath string.
    pub fn classpath_string(&self) -> String {
        join_classpath(self.classpath.iter().map(PathBuf::as_path))
    }
}
