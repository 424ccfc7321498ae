//! JVM-backed implementations of [`Loadable`] and [`Evaluator`].
//!
//! Programs run in a child `java` process with the session's classpath.
//! Typed `main` overloads and single lines are evaluated through
//! `kotlinc -e`, which compiles and runs a script against the same
//! classpath.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::builder::kotlinc::parse_messages;
use crate::core::ResolvedUnit;
use crate::runtime::{
    ArgValue, EntryPoint, EvalError, EvalValue, Evaluator, Invocation, Loadable, LoadingSession,
    ParamKind,
};
use crate::util::process::ProcessBuilder;

static MAIN_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*fun\s+main\s*\(([^)]*)\)").expect("valid main regex")
});

/// Entry points declared by `fun main(...)` lines in a source text.
///
/// `main()`, `main(args: Array<String>)` and `main(vararg args: String)`
/// all take the argument vector. Overloads with parameter types outside
/// the coercible set are skipped.
pub fn parse_entry_points(text: &str) -> Vec<EntryPoint> {
    let mut entries = Vec::new();
    for caps in MAIN_SIGNATURE.captures_iter(text) {
        let params: Vec<&str> = caps[1]
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        let entry = match params.as_slice() {
            [] => Some(EntryPoint::StringVector),
            [single] if is_string_vector(single) => Some(EntryPoint::StringVector),
            _ => params
                .iter()
                .map(|param| {
                    let (_, ty) = param.split_once(':')?;
                    ParamKind::from_type_name(ty)
                })
                .collect::<Option<Vec<_>>>()
                .map(EntryPoint::Positional),
        };

        if let Some(entry) = entry {
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        }
    }
    entries
}

fn is_string_vector(param: &str) -> bool {
    let Some((name, ty)) = param.split_once(':') else {
        return false;
    };
    let ty: String = ty.chars().filter(|c| !c.is_whitespace()).collect();
    ty == "Array<String>" || (name.trim_start().starts_with("vararg ") && ty == "String")
}

/// Kotlin literal for a coerced argument. Absent values take the
/// parameter type's zero value.
pub fn render_literal(kind: ParamKind, value: &ArgValue) -> String {
    match (kind, value) {
        (_, ArgValue::Int(v)) => v.to_string(),
        (_, ArgValue::Float(v)) => format!("{:?}", v),
        (_, ArgValue::Bool(v)) => v.to_string(),
        (_, ArgValue::Char(c)) if c.is_ascii() => format!("'{}'", c.escape_default()),
        (_, ArgValue::Char(c)) => format!("'{}'", c),
        (_, ArgValue::Text(s)) => quote(s),
        (_, ArgValue::Path(p)) => format!("java.io.File({})", quote(&p.to_string_lossy())),
        (ParamKind::Int, ArgValue::Absent) => "0".to_string(),
        (ParamKind::Float, ArgValue::Absent) => "0.0".to_string(),
        (ParamKind::Bool, ArgValue::Absent) => "false".to_string(),
        (ParamKind::Char, ArgValue::Absent) => "'\\u0000'".to_string(),
        (ParamKind::Text, ArgValue::Absent) => "\"\"".to_string(),
        (ParamKind::Path, ArgValue::Absent) => "java.io.File(\"\")".to_string(),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn import_lines(imports: &[String]) -> String {
    imports.iter().map(|i| format!("import {}\n", i)).collect()
}

/// A compiled unit with a `main`, run on the JVM.
#[derive(Debug, Clone)]
pub struct JvmProgram {
    java: PathBuf,
    kotlinc: PathBuf,
    main_class: String,
    package: Option<String>,
    entries: Vec<EntryPoint>,
}

impl JvmProgram {
    /// `None` when the unit declares no entry point.
    pub fn for_unit(unit: &ResolvedUnit, java: &Path, kotlinc: &Path) -> Result<Option<Self>> {
        let Some(main_class) = unit.main_class() else {
            return Ok(None);
        };
        let text = std::fs::read_to_string(unit.file())
            .with_context(|| format!("failed to read {}", unit.file().display()))?;

        Ok(Some(JvmProgram {
            java: java.to_path_buf(),
            kotlinc: kotlinc.to_path_buf(),
            main_class,
            package: unit.package_name().map(str::to_string),
            entries: parse_entry_points(&text),
        }))
    }

    pub fn main_class(&self) -> &str {
        &self.main_class
    }

    /// Script calling a typed `main` overload.
    pub fn positional_script(&self, args: &[(ParamKind, ArgValue)]) -> String {
        let target = match &self.package {
            Some(package) => format!("{}.main", package),
            None => "main".to_string(),
        };
        let literals: Vec<String> = args
            .iter()
            .map(|(kind, value)| render_literal(*kind, value))
            .collect();
        format!("{}({})", target, literals.join(", "))
    }

    fn command(&self, session: &LoadingSession, invocation: &Invocation) -> ProcessBuilder {
        match invocation {
            Invocation::StringVector(argv) => ProcessBuilder::new(&self.java)
                .arg("-cp")
                .arg(session.classpath_string())
                .arg(&self.main_class)
                .args(argv),
            Invocation::Positional(args) => ProcessBuilder::new(&self.kotlinc)
                .arg("-cp")
                .arg(session.classpath_string())
                .arg("-e")
                .arg(self.positional_script(args)),
        }
    }
}

impl Loadable for JvmProgram {
    fn entry_points(&self) -> Vec<EntryPoint> {
        self.entries.clone()
    }

    fn call(&self, session: &LoadingSession, invocation: &Invocation) -> Result<i32> {
        let cmd = self.command(session, invocation);
        tracing::debug!("{}", cmd.display_command());
        let status = cmd.status()?;
        Ok(status.code().unwrap_or(1))
    }
}

/// Line evaluator backed by `kotlinc -e`.
///
/// Each line runs in a fresh script. Imports and declarations that
/// evaluated cleanly are replayed ahead of later lines so they stay in
/// scope. Imports always precede declarations.
#[derive(Debug, Clone)]
pub struct KotlincEvaluator {
    kotlinc: PathBuf,
    /// Auto-imports of the loading session
    preamble: String,
    /// `import` lines entered at the prompt
    imports: Vec<String>,
    declarations: Vec<String>,
}

impl KotlincEvaluator {
    pub fn new(kotlinc: impl Into<PathBuf>) -> Self {
        KotlincEvaluator {
            kotlinc: kotlinc.into(),
            preamble: String::new(),
            imports: Vec::new(),
            declarations: Vec::new(),
        }
    }

    /// Full script text evaluated for `line`.
    pub fn script(&self, line: &str) -> String {
        let mut script = self.preamble.clone();
        for import in &self.imports {
            script.push_str(import);
            script.push('\n');
        }
        if is_import(line) {
            script.push_str(line.trim());
            script.push('\n');
        }
        for declaration in &self.declarations {
            script.push_str(declaration);
            script.push('\n');
        }
        if !is_import(line) {
            script.push_str(line);
        }
        script
    }

    /// Keep a successfully evaluated line for replay.
    fn record(&mut self, line: &str) {
        if is_import(line) {
            self.imports.push(line.trim().to_string());
        } else if is_declaration(line) {
            self.declarations.push(line.to_string());
        }
    }
}

fn is_import(line: &str) -> bool {
    line.trim_start().starts_with("import ")
}

fn is_declaration(line: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "val ", "var ", "fun ", "class ", "data ", "object ", "interface ", "enum ", "typealias ",
    ];
    let line = line.trim_start();
    KEYWORDS.iter().any(|k| line.starts_with(k))
}

/// Interpret the outcome of one `kotlinc -e` run.
pub fn classify_output(success: bool, stdout: &str, stderr: &str) -> Result<EvalValue, EvalError> {
    if !success {
        let messages = parse_messages(stderr);
        if let Some(error) = messages.iter().find(|m| m.severity.is_error()) {
            return Err(EvalError::Syntax(error.message.lines().next().unwrap_or("").to_string()));
        }
        let reason = stderr
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("evaluation failed");
        return Err(EvalError::Runtime(reason.to_string()));
    }

    match stdout.trim_end_matches(['\r', '\n']) {
        "" => Ok(EvalValue::Unit),
        "null" => Ok(EvalValue::Null),
        value => Ok(EvalValue::Value(value.to_string())),
    }
}

impl Evaluator for KotlincEvaluator {
    fn prepare(&mut self, session: &LoadingSession) -> Result<()> {
        self.preamble = import_lines(session.auto_imports());
        Ok(())
    }

    fn eval(&mut self, session: &LoadingSession, line: &str) -> Result<EvalValue, EvalError> {
        let cmd = ProcessBuilder::new(&self.kotlinc)
            .arg("-cp")
            .arg(session.classpath_string())
            .arg("-e")
            .arg(self.script(line));
        let output = cmd
            .exec()
            .map_err(|e| EvalError::Runtime(format!("{:#}", e)))?;

        let result = classify_output(
            output.status.success(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        );
        if result.is_ok() {
            self.record(line);
        }
        result
    }
}
