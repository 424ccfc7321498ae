//! Compilation of resolved units.
//!
//! The compiler itself is an external collaborator behind the [`Compiler`]
//! trait. This module hands it a flat, ordered source list and library list
//! plus a workspace, and skips the call entirely when the inputs have not
//! changed since the last successful build.

pub mod fingerprint;
pub mod kotlinc;

pub use fingerprint::BuildFingerprint;
pub use kotlinc::Kotlinc;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::{ResolvedUnit, WorkspacePaths};
use crate::util::shell::{Shell, Status};

/// Severity of a compiler message, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompileSeverity {
    Logging,
    Info,
    Warning,
    Error,
    Exception,
}

impl CompileSeverity {
    /// Only warnings and worse are shown to the user.
    pub fn is_displayed(self) -> bool {
        self >= CompileSeverity::Warning
    }

    pub fn is_error(self) -> bool {
        self >= CompileSeverity::Error
    }

    pub fn parse(s: &str) -> Option<CompileSeverity> {
        match s {
            "logging" => Some(CompileSeverity::Logging),
            "info" => Some(CompileSeverity::Info),
            "warning" => Some(CompileSeverity::Warning),
            "error" => Some(CompileSeverity::Error),
            "exception" => Some(CompileSeverity::Exception),
            _ => None,
        }
    }
}

/// One diagnostic produced by the compiler, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileMessage {
    pub severity: CompileSeverity,
    pub message: String,
    /// `path:line:column`, when the compiler reported one
    pub location: Option<String>,
}

impl fmt::Display for CompileMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}\n at {}", self.message, location),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Inputs for one compiler invocation.
#[derive(Debug, Clone)]
pub struct CompileRequest<'a> {
    pub sources: &'a [PathBuf],
    pub libraries: &'a [PathBuf],
    pub workspace: &'a WorkspacePaths,
}

#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub messages: Vec<CompileMessage>,
    /// Directory holding the compiled classes
    pub output: PathBuf,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.severity.is_error())
    }
}

/// A compiler collaborator.
pub trait Compiler {
    /// Identity folded into build fingerprints, so switching compilers
    /// forces a rebuild.
    fn identity(&self) -> String;

    fn compile(&self, request: &CompileRequest<'_>) -> Result<CompileOutput>;
}

/// Compile a unit into its build workspace and return the output directory.
///
/// Compiler messages of warning severity or worse are printed; any error
/// aborts before execution.
pub fn compile_unit(compiler: &dyn Compiler, unit: &ResolvedUnit, shell: &Shell) -> Result<PathBuf> {
    let sources = unit.sources();
    let libraries: Vec<PathBuf> = unit
        .libraries()
        .into_iter()
        .map(|lib| lib.primary)
        .collect();
    let workspace = unit.workspace();
    let name = display_name(unit.file());

    let fingerprint = BuildFingerprint::compute(&sources, &libraries, &compiler.identity())?;
    let output = workspace.output_dir();
    if output.is_dir() && BuildFingerprint::load(&workspace.fingerprint_file()).as_ref() == Some(&fingerprint) {
        shell.status(Status::Fresh, &name);
        return Ok(output);
    }

    // The compiler may clear the output directory before failing.
    let fingerprint_file = workspace.fingerprint_file();
    match std::fs::remove_file(&fingerprint_file) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            return Err(e).with_context(|| format!("failed to remove {}", fingerprint_file.display()));
        }
        _ => {}
    }

    shell.status(Status::Compiling, &name);
    let result = compiler.compile(&CompileRequest {
        sources: &sources,
        libraries: &libraries,
        workspace,
    })?;

    for message in result.messages.iter().filter(|m| m.severity.is_displayed()) {
        if message.severity.is_error() {
            shell.error(message);
        } else {
            shell.warn(message);
        }
    }
    if result.has_errors() {
        bail!("could not compile `{}`", unit.file().display());
    }

    fingerprint.save(&fingerprint_file)?;
    Ok(result.output)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{quiet_shell, ScriptedCompiler};
    use crate::core::{Library, Manifest, WorkspaceLayout};
    use tempfile::TempDir;

    fn unit(tmp: &TempDir) -> ResolvedUnit {
        let file = tmp.path().join("hello.kt");
        std::fs::write(&file, "fun main() {}\n").unwrap();
        let lib = tmp.path().join("stdlib.jar");
        std::fs::write(&lib, "jar").unwrap();
        let layout = WorkspaceLayout::new(tmp.path().join("build"), tmp.path().join("project"));
        ResolvedUnit::new(
            file.clone(),
            Manifest::load(&file).unwrap(),
            tmp.path().join("stub.kt"),
            vec![Library::new("org.jetbrains.kotlin:kotlin-stdlib:1.3.50", lib)],
            Vec::new(),
            Vec::new(),
            layout.paths(&file),
        )
    }

    #[test]
    fn test_severity_filter() {
        assert!(!CompileSeverity::Info.is_displayed());
        assert!(CompileSeverity::Warning.is_displayed());
        assert!(!CompileSeverity::Warning.is_error());
        assert!(CompileSeverity::Exception.is_error());
    }

    #[test]
    fn test_unchanged_inputs_skip_compiler() {
        let tmp = TempDir::new().unwrap();
        let unit = unit(&tmp);
        let compiler = ScriptedCompiler::succeeding();

        let first = compile_unit(&compiler, &unit, &quiet_shell()).unwrap();
        let second = compile_unit(&compiler, &unit, &quiet_shell()).unwrap();
        assert_eq!(first, second);
        assert_eq!(compiler.calls(), 1);

        std::fs::write(unit.file(), "fun main() { println(1) }\n").unwrap();
        compile_unit(&compiler, &unit, &quiet_shell()).unwrap();
        assert_eq!(compiler.calls(), 2);
    }

    #[test]
    fn test_failed_build_forces_recompile_after_revert() {
        let tmp = TempDir::new().unwrap();
        let unit = unit(&tmp);
        let good = ScriptedCompiler::succeeding();
        let bad = ScriptedCompiler::failing("expecting an element");

        compile_unit(&good, &unit, &quiet_shell()).unwrap();
        assert!(unit.workspace().fingerprint_file().exists());

        std::fs::write(unit.file(), "fun main() {\n").unwrap();
        assert!(compile_unit(&bad, &unit, &quiet_shell()).is_err());
        assert!(!unit.workspace().fingerprint_file().exists());

        std::fs::write(unit.file(), "fun main() {}\n").unwrap();
        compile_unit(&good, &unit, &quiet_shell()).unwrap();
        assert_eq!(good.calls(), 2);
    }

    #[test]
    fn test_errors_abort() {
        let tmp = TempDir::new().unwrap();
        let unit = unit(&tmp);
        let compiler = ScriptedCompiler::failing("unresolved reference: foo");

        let err = compile_unit(&compiler, &unit, &quiet_shell()).unwrap_err();
        assert!(err.to_string().contains("hello.kt"));
        assert!(!unit.workspace().fingerprint_file().exists());
    }
}
