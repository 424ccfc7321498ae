//! Script manifests: the directives found in one source file.
//!
//! Parsing is line based and permissive. Each trimmed line is classified by
//! its leading token; a directive argument is the text between the first
//! pair of double quotes after the directive prefix. Lines that do not match,
//! including directives with a missing closing quote, are ignored.

use std::path::{Path, PathBuf};

use crate::resolver::errors::ResolveError;

/// `@file:Repository("<url>")`
pub const REPOSITORY_PREFIX: &str = "@file:Repository(";
/// `@file:DependsOn("<coordinate>")`
pub const DEPENDS_ON_PREFIX: &str = "@file:DependsOn(";
/// `@file:Import("<path or url>")`
pub const IMPORT_PREFIX: &str = "@file:Import(";

const PACKAGE_PREFIX: &str = "package ";
const IMPORT_STATEMENT_PREFIX: &str = "import ";
const MAIN_MARKER: &str = "fun main(";

/// One classified line of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Repository(String),
    DependsOn(String),
    Include(String),
    Package(String),
    Import(String),
    MainMarker,
}

impl Directive {
    /// Classify a single line. Returns `None` for ordinary code.
    pub fn classify(line: &str) -> Option<Directive> {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix(REPOSITORY_PREFIX) {
            return quoted_argument(rest).map(Directive::Repository);
        }
        if let Some(rest) = line.strip_prefix(DEPENDS_ON_PREFIX) {
            return quoted_argument(rest).map(Directive::DependsOn);
        }
        if let Some(rest) = line.strip_prefix(IMPORT_PREFIX) {
            return quoted_argument(rest).map(Directive::Include);
        }
        if let Some(rest) = line.strip_prefix(PACKAGE_PREFIX) {
            let name = rest.trim().trim_end_matches(';').trim();
            return (!name.is_empty()).then(|| Directive::Package(name.to_string()));
        }
        if let Some(rest) = line.strip_prefix(IMPORT_STATEMENT_PREFIX) {
            let name = rest.trim().trim_end_matches(';').trim();
            return (!name.is_empty()).then(|| Directive::Import(name.to_string()));
        }
        if line.starts_with(MAIN_MARKER) {
            return Some(Directive::MainMarker);
        }

        None
    }
}

/// Text between the first pair of double quotes.
pub fn quoted_argument(s: &str) -> Option<String> {
    let start = s.find('"')? + 1;
    let len = s[start..].find('"')?;
    Some(s[start..start + len].to_string())
}

/// Where an include directive points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeRef {
    /// Relative to the including file's directory (or absolute).
    Local(PathBuf),
    /// Fetched through the remote source cache.
    Remote(String),
}

impl IncludeRef {
    pub fn parse(reference: &str) -> IncludeRef {
        let reference = reference.trim();
        if reference.starts_with("http:") || reference.starts_with("https:") {
            IncludeRef::Remote(reference.to_string())
        } else {
            IncludeRef::Local(PathBuf::from(reference))
        }
    }
}

/// Parsed directive metadata for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    path: PathBuf,
    package_name: Option<String>,
    has_main: bool,
    repositories: Vec<String>,
    dependencies: Vec<String>,
    includes: Vec<IncludeRef>,
    imports: Vec<String>,
}

impl Manifest {
    /// Read and parse a script from disk.
    pub fn load(path: &Path) -> Result<Manifest, ResolveError> {
        let text = std::fs::read_to_string(path).map_err(|source| ResolveError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Manifest::parse(path, &text))
    }

    /// Parse script text. Never fails.
    pub fn parse(path: &Path, text: &str) -> Manifest {
        let mut manifest = Manifest {
            path: path.to_path_buf(),
            package_name: None,
            has_main: false,
            repositories: Vec::new(),
            dependencies: Vec::new(),
            includes: Vec::new(),
            imports: Vec::new(),
        };

        for directive in text.lines().filter_map(Directive::classify) {
            match directive {
                Directive::Repository(url) => manifest.repositories.push(url),
                Directive::DependsOn(coord) => manifest.dependencies.push(coord),
                Directive::Include(reference) => {
                    manifest.includes.push(IncludeRef::parse(&reference))
                }
                Directive::Package(name) => manifest.package_name = Some(name),
                Directive::Import(name) => manifest.imports.push(name),
                Directive::MainMarker => manifest.has_main = true,
            }
        }

        manifest
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn package_name(&self) -> Option<&str> {
        self.package_name.as_deref()
    }

    pub fn has_main(&self) -> bool {
        self.has_main
    }

    pub fn repositories(&self) -> &[String] {
        &self.repositories
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn includes(&self) -> &[IncludeRef] {
        &self.includes
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// File name without extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// JVM class the compiler generates for top-level declarations:
    /// `hello.kt` in package `com.test` becomes `com.test.HelloKt`.
    pub fn file_class_name(&self) -> String {
        let stem = self.stem();
        let mut chars = stem.chars();
        let capitalized: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        let class = format!("{}Kt", capitalized.replace(['-', '.', ' '], "_"));

        match &self.package_name {
            Some(package) => format!("{}.{}", package, class),
            None => class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DEPENDS_TEST: &str = r#"@file:Repository("https://dl.bintray.com/lightningkite/com.lightningkite.kotlin")
@file:DependsOn("com.lightningkite.kotlin:okhttp-jackson:0.6.5")

package com.test

import lk.kotlin.okhttp.jackson.lambdaJackson
import okhttp3.Request

val hello = "Hello World!"

fun main() {
    println(hello)
}
"#;

    #[test]
    fn test_parse_directives() {
        let manifest = Manifest::parse(Path::new("/scripts/dependsTest.kt"), DEPENDS_TEST);

        assert_eq!(
            manifest.repositories(),
            ["https://dl.bintray.com/lightningkite/com.lightningkite.kotlin"]
        );
        assert_eq!(
            manifest.dependencies(),
            ["com.lightningkite.kotlin:okhttp-jackson:0.6.5"]
        );
        assert_eq!(manifest.package_name(), Some("com.test"));
        assert_eq!(
            manifest.imports(),
            ["lk.kotlin.okhttp.jackson.lambdaJackson", "okhttp3.Request"]
        );
        assert!(manifest.has_main());
        assert!(manifest.includes().is_empty());
    }

    #[test]
    fn test_include_classification() {
        let text = r#"
@file:Import("https://gist.githubusercontent.com/u/HumanHash.kt")
@file:Import("../shared/util.kt")
@file:Import("http://insecure.example.com/x.kt")
"#;
        let manifest = Manifest::parse(Path::new("/a/b.kt"), text);
        assert_eq!(
            manifest.includes(),
            [
                IncludeRef::Remote("https://gist.githubusercontent.com/u/HumanHash.kt".to_string()),
                IncludeRef::Local(PathBuf::from("../shared/util.kt")),
                IncludeRef::Remote("http://insecure.example.com/x.kt".to_string()),
            ]
        );
    }

    #[test]
    fn test_malformed_directives_are_ignored() {
        let text = r#"
@file:DependsOn("missing.closing:quote
@file:DependsOn()
@file:Repository(https://no-quotes)
package
fun notMain() {}
"#;
        let manifest = Manifest::parse(Path::new("x.kt"), text);
        assert!(manifest.dependencies().is_empty());
        assert!(manifest.repositories().is_empty());
        assert!(manifest.package_name().is_none());
        assert!(!manifest.has_main());
    }

    #[test]
    fn test_argument_is_first_quoted_pair() {
        assert_eq!(
            Directive::classify(r#"  @file:DependsOn("a:b:1.0") // "comment""#),
            Some(Directive::DependsOn("a:b:1.0".to_string()))
        );
        assert_eq!(quoted_argument(r#"("")"#), Some(String::new()));
    }

    #[test]
    fn test_main_marker_and_indentation() {
        assert_eq!(
            Directive::classify("    fun main(args: Array<String>) {"),
            Some(Directive::MainMarker)
        );
        assert_eq!(Directive::classify("fun mainly() {}"), None);
    }

    #[test]
    fn test_file_class_name() {
        let manifest = Manifest::parse(Path::new("/x/hello.kt"), "package com.test\n");
        assert_eq!(manifest.file_class_name(), "com.test.HelloKt");

        let manifest = Manifest::parse(Path::new("/x/my-script.kt"), "");
        assert_eq!(manifest.file_class_name(), "My_scriptKt");
    }

    #[test]
    fn test_load_missing_file_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.kt");

        let err = Manifest::load(&missing).unwrap_err();
        assert!(matches!(err, ResolveError::ManifestParse { .. }));
        assert!(err.to_string().contains("missing.kt"));
    }
}
