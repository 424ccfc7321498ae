//! Running compiled units.
//!
//! - [`session::LoadingSession`] is the explicit, owned loading context:
//!   an ordered classpath plus auto-imports, extendable in place.
//! - [`invoker`] picks an entry point and coerces positional arguments.
//! - [`Evaluator`] evaluates single lines against a session.
//! - [`repl`] is the interactive loop built on both.
//! - [`jvm`] implements the seams by launching `java` and `kotlinc`.

pub mod invoker;
pub mod jvm;
pub mod repl;
pub mod session;

pub use invoker::{coerce, invoke_entry_point, InvokeOutcome};
pub use session::LoadingSession;

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use thiserror::Error;

/// Closed set of parameter types an entry point may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Float,
    Bool,
    Char,
    Text,
    Path,
}

impl ParamKind {
    /// Map a declared Kotlin type name onto a coercion target.
    pub fn from_type_name(name: &str) -> Option<ParamKind> {
        match name.trim().trim_end_matches('?') {
            "Int" | "Long" | "Short" | "Byte" => Some(ParamKind::Int),
            "Float" | "Double" => Some(ParamKind::Float),
            "Boolean" => Some(ParamKind::Bool),
            "Char" => Some(ParamKind::Char),
            "String" | "CharSequence" => Some(ParamKind::Text),
            "File" | "java.io.File" | "Path" | "java.nio.file.Path" => Some(ParamKind::Path),
            _ => None,
        }
    }
}

/// A coerced argument. `Absent` stands in for a value that did not parse.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    Text(String),
    Path(PathBuf),
    Absent,
}

/// Shape of a callable entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPoint {
    /// Takes the whole argument vector
    StringVector,
    /// Takes one coerced value per declared parameter
    Positional(Vec<ParamKind>),
}

/// Arguments prepared for an entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    StringVector(Vec<String>),
    Positional(Vec<(ParamKind, ArgValue)>),
}

/// Something that can be called once loaded into a session.
pub trait Loadable {
    fn entry_points(&self) -> Vec<EntryPoint>;

    /// Call the entry point; returns the program's exit code.
    fn call(&self, session: &LoadingSession, invocation: &Invocation) -> Result<i32>;
}

/// Result of evaluating one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalValue {
    Value(String),
    Null,
    /// The line produced no value
    Unit,
}

impl EvalValue {
    /// Text printed for the value; `Unit` prints nothing.
    pub fn render(&self) -> Option<String> {
        match self {
            EvalValue::Value(v) => Some(v.clone()),
            EvalValue::Null => Some("null".to_string()),
            EvalValue::Unit => None,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("Syntax Error: {0}")]
    Syntax(String),

    #[error("Error: {0}")]
    Runtime(String),
}

/// Line evaluator bound to a loading session.
pub trait Evaluator {
    /// Rebuild the evaluation context after the session changed.
    fn prepare(&mut self, session: &LoadingSession) -> Result<()>;

    fn eval(&mut self, session: &LoadingSession, line: &str) -> Result<EvalValue, EvalError>;
}

/// Live extension of a session from the REPL.
pub trait SessionExtender {
    /// Resolve a coordinate; returns the classpath entries to add.
    fn add_dependency(&mut self, coordinate: &str) -> Result<Vec<PathBuf>>;

    /// Resolve and compile an include; returns the classpath entries to add.
    fn add_include(&mut self, reference: &str) -> Result<Vec<PathBuf>>;
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::Int => "Int",
            ParamKind::Float => "Double",
            ParamKind::Bool => "Boolean",
            ParamKind::Char => "Char",
            ParamKind::Text => "String",
            ParamKind::Path => "File",
        };
        write!(f, "{}", name)
    }
}
