//! Declarations for the directive annotations.
//!
//! Scripts use `@file:Repository`, `@file:DependsOn` and `@file:Import`,
//! which the compiler only accepts if matching annotation classes exist in
//! the script's package. One stub file per package is written once and
//! shared by every script in that package.

use std::io;
use std::path::{Path, PathBuf};

use crate::util::fs::write_atomic;

const STUB_BODY: &str = r#"
@Retention(AnnotationRetention.SOURCE)
@Target(AnnotationTarget.FILE)
@Repeatable
annotation class Repository(val url: String)

@Retention(AnnotationRetention.SOURCE)
@Target(AnnotationTarget.FILE)
@Repeatable
annotation class DependsOn(val maven: String)

@Retention(AnnotationRetention.SOURCE)
@Target(AnnotationTarget.FILE)
@Repeatable
annotation class Import(val file: String)
"#;

/// Stub file name for a package; the default package gets `default`.
pub fn stub_file_name(package: Option<&str>) -> String {
    let suffix = package
        .map(|p| p.replace('.', "_"))
        .unwrap_or_else(|| "default".to_string());
    format!("FileAnnotations_{}.kt", suffix)
}

/// Contents of the stub file for a package.
pub fn stub_contents(package: Option<&str>) -> String {
    let package_line = package
        .map(|p| format!("package {}\n", p))
        .unwrap_or_default();
    format!("{}{}", package_line, STUB_BODY)
}

/// Return the stub file for `package`, writing it if it does not exist yet.
pub fn ensure_stub_file(dir: &Path, package: Option<&str>) -> io::Result<PathBuf> {
    let path = dir.join(stub_file_name(package));
    if !path.exists() {
        write_atomic(&path, stub_contents(package).as_bytes())?;
    }
    Ok(path)
}
