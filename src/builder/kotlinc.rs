//! `kotlinc` command-line compiler.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::builder::{CompileMessage, CompileOutput, CompileRequest, CompileSeverity, Compiler};
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists};
use crate::util::process::{find_tool, join_classpath, ProcessBuilder};

static MESSAGE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<loc>.+?:\d+:\d+): )?(?P<sev>error|warning|info|exception|logging): (?P<msg>.*)$")
        .expect("valid message regex")
});

/// JVM compiler driven through the `kotlinc` executable.
#[derive(Debug, Clone)]
pub struct Kotlinc {
    program: PathBuf,
}

impl Kotlinc {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Kotlinc {
            program: program.into(),
        }
    }

    /// Find `kotlinc` on `PATH` or under `$KOTLIN_HOME/bin`.
    pub fn locate(configured: &str) -> Result<Self> {
        let program = find_tool(configured, "KOTLIN_HOME").with_context(|| {
            format!(
                "could not find `{}`; install the Kotlin compiler or set [kotlin] kotlinc in config.toml",
                configured
            )
        })?;
        tracing::debug!("using kotlinc at {}", program.display());
        Ok(Kotlinc::new(program))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command compiling `sources` against `libraries` into `output`.
    pub fn command(&self, sources: &[PathBuf], libraries: &[PathBuf], output: &Path) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.program).arg("-no-stdlib").arg("-no-reflect");
        if !libraries.is_empty() {
            cmd = cmd
                .arg("-cp")
                .arg(join_classpath(libraries.iter().map(PathBuf::as_path)));
        }
        cmd.arg("-d").arg(output).args(sources)
    }
}

/// Parse `path:line:col: severity: message` lines. Continuation lines
/// (source excerpts, carets) are attached to the preceding message.
pub fn parse_messages(text: &str) -> Vec<CompileMessage> {
    let mut messages: Vec<CompileMessage> = Vec::new();
    for line in text.lines() {
        if let Some(caps) = MESSAGE_LINE.captures(line) {
            if let Some(severity) = CompileSeverity::parse(&caps["sev"]) {
                messages.push(CompileMessage {
                    severity,
                    message: caps["msg"].to_string(),
                    location: caps.name("loc").map(|m| m.as_str().to_string()),
                });
                continue;
            }
        }
        if let Some(last) = messages.last_mut() {
            if !line.trim().is_empty() {
                last.message.push('\n');
                last.message.push_str(line);
            }
        }
    }
    messages
}

impl Compiler for Kotlinc {
    fn identity(&self) -> String {
        self.program.display().to_string()
    }

    fn compile(&self, request: &CompileRequest<'_>) -> Result<CompileOutput> {
        let output = request.workspace.output_dir();
        remove_dir_all_if_exists(&output)?;
        ensure_dir(&output)?;

        let result = self
            .command(request.sources, request.libraries, &output)
            .exec()?;

        let mut text = String::from_utf8_lossy(&result.stderr).into_owned();
        text.push_str(&String::from_utf8_lossy(&result.stdout));
        let mut messages = parse_messages(&text);

        if !result.status.success() && !messages.iter().any(|m| m.severity.is_error()) {
            messages.push(CompileMessage {
                severity: CompileSeverity::Error,
                message: format!(
                    "`{}` exited with {:?}\n{}",
                    self.program.display(),
                    result.status.code(),
                    text.trim()
                ),
                location: None,
            });
        }

        Ok(CompileOutput { messages, output })
    }
}
