//! Test doubles for Skate unit tests.
//!
//! Every external collaborator (network, artifact resolver, compiler,
//! program runner, evaluator) has an in-memory fake here so resolution and
//! execution logic can be tested without a JDK or network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use skate::test_support::MockHttp;
//!
//! let http = Arc::new(MockHttp::new());
//! http.respond("https://h/helpers.kt", 200, "fun helper() = 1");
//! let cache = RemoteSourceCache::new(dir, http.clone());
//! // ...
//! assert_eq!(http.calls(), 1);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};

use crate::builder::{CompileMessage, CompileOutput, CompileRequest, CompileSeverity, Compiler};
use crate::core::{Coordinate, Library, Repository};
use crate::resolver::ResolveError;
use crate::runtime::{
    EntryPoint, EvalError, EvalValue, Evaluator, Invocation, Loadable, LoadingSession,
    SessionExtender,
};
use crate::sources::{ArtifactResolver, HttpFetcher, HttpResponse, VersionLister};
use crate::util::shell::{ColorChoice, Shell, Verbosity};

/// A shell that prints nothing but errors and warnings.
pub fn quiet_shell() -> Shell {
    Shell::new(Verbosity::Quiet, ColorChoice::Never)
}

/// Mock HTTP transport. Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct MockHttp {
    responses: Mutex<HashMap<String, std::result::Result<(u16, Vec<u8>), String>>>,
    calls: AtomicUsize,
}

impl MockHttp {
    pub fn new() -> Self {
        MockHttp::default()
    }

    /// Answer `url` with a status and body from now on.
    pub fn respond(&self, url: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.lock().insert(url.to_string(), Ok((status, body.into())));
    }

    /// Fail requests to `url` at the transport level from now on.
    pub fn fail(&self, url: &str, message: &str) {
        self.lock().insert(url.to_string(), Err(message.to_string()));
    }

    /// Number of requests made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, std::result::Result<(u16, Vec<u8>), String>>> {
        self.responses.lock().unwrap()
    }
}

impl HttpFetcher for MockHttp {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.lock().get(url) {
            Some(Ok((status, body))) => Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            }),
            Some(Err(message)) => Err(anyhow!("{}", message)),
            None => Ok(HttpResponse {
                status: 404,
                body: b"Not Found".to_vec(),
            }),
        }
    }
}

/// Artifact resolver and version lister backed by a fixed table.
///
/// Resolving a coordinate yields one library named after it, with a
/// placeholder jar path. Every resolution request is recorded.
#[derive(Debug, Default)]
pub struct StaticArtifacts {
    versions: HashMap<String, Vec<String>>,
    requests: Mutex<Vec<String>>,
}

impl StaticArtifacts {
    pub fn new() -> Self {
        StaticArtifacts::default()
    }

    /// Publish `versions` of `group:artifact`.
    pub fn with_versions(mut self, key: &str, versions: &[&str]) -> Self {
        self.versions
            .insert(key.to_string(), versions.iter().map(|v| v.to_string()).collect());
        self
    }

    /// Coordinates passed to `resolve_libraries`, in call order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl VersionLister for StaticArtifacts {
    fn list_versions(
        &self,
        group: &str,
        artifact: &str,
        _repositories: &[Repository],
    ) -> Result<Vec<String>, ResolveError> {
        Ok(self
            .versions
            .get(&format!("{}:{}", group, artifact))
            .cloned()
            .unwrap_or_default())
    }
}

impl ArtifactResolver for StaticArtifacts {
    fn resolve_libraries(
        &self,
        coordinate: &Coordinate,
        _repositories: &[Repository],
    ) -> Result<Vec<Library>, ResolveError> {
        self.requests.lock().unwrap().push(coordinate.to_string());
        let published = self
            .versions
            .get(&coordinate.key())
            .is_some_and(|versions| versions.iter().any(|v| v == coordinate.version()));
        if !published {
            return Err(ResolveError::ArtifactNotFound {
                coordinate: coordinate.to_string(),
                reason: "not in the static table".to_string(),
            });
        }
        Ok(vec![Library::new(
            coordinate.to_string(),
            PathBuf::from("/fake-m2").join(coordinate.file_name()),
        )])
    }
}

/// Compiler double that creates the output directory and reports either
/// nothing or a single error.
#[derive(Debug, Default)]
pub struct ScriptedCompiler {
    error: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedCompiler {
    pub fn succeeding() -> Self {
        ScriptedCompiler::default()
    }

    pub fn failing(message: &str) -> Self {
        ScriptedCompiler {
            error: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Compiler for ScriptedCompiler {
    fn identity(&self) -> String {
        "scripted".to_string()
    }

    fn compile(&self, request: &CompileRequest<'_>) -> Result<CompileOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let output = request.workspace.output_dir();
        std::fs::create_dir_all(&output)?;
        let messages = self
            .error
            .iter()
            .map(|message| CompileMessage {
                severity: CompileSeverity::Error,
                message: message.clone(),
                location: request.sources.first().map(|s| format!("{}:1:1", s.display())),
            })
            .collect();
        Ok(CompileOutput { messages, output })
    }
}

/// Loadable that records every invocation and exits with 0.
#[derive(Debug, Default)]
pub struct RecordingLoadable {
    entries: Vec<EntryPoint>,
    invocations: Mutex<Vec<Invocation>>,
}

impl RecordingLoadable {
    pub fn new(entries: Vec<EntryPoint>) -> Self {
        RecordingLoadable {
            entries,
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }
}

impl Loadable for RecordingLoadable {
    fn entry_points(&self) -> Vec<EntryPoint> {
        self.entries.clone()
    }

    fn call(&self, _session: &LoadingSession, invocation: &Invocation) -> Result<i32> {
        self.invocations.lock().unwrap().push(invocation.clone());
        Ok(0)
    }
}

/// Evaluator answering from a table of known lines.
#[derive(Debug, Default)]
pub struct ScriptedEvaluator {
    answers: HashMap<String, std::result::Result<EvalValue, EvalError>>,
    prepared: usize,
}

impl ScriptedEvaluator {
    pub fn new() -> Self {
        ScriptedEvaluator::default()
    }

    pub fn with(mut self, line: &str, answer: std::result::Result<EvalValue, EvalError>) -> Self {
        self.answers.insert(line.to_string(), answer);
        self
    }

    /// How many times the evaluation context was (re)built.
    pub fn prepared(&self) -> usize {
        self.prepared
    }
}

impl Evaluator for ScriptedEvaluator {
    fn prepare(&mut self, _session: &LoadingSession) -> Result<()> {
        self.prepared += 1;
        Ok(())
    }

    fn eval(&mut self, _session: &LoadingSession, line: &str) -> std::result::Result<EvalValue, EvalError> {
        self.answers
            .get(line)
            .cloned()
            .unwrap_or_else(|| Err(EvalError::Runtime(format!("unscripted line `{}`", line))))
    }
}

/// Session extender with fixed answers for known coordinates and includes.
#[derive(Debug, Default)]
pub struct RecordingExtender {
    dependencies: HashMap<String, Vec<PathBuf>>,
    includes: HashMap<String, Vec<PathBuf>>,
}

impl RecordingExtender {
    pub fn new() -> Self {
        RecordingExtender::default()
    }

    pub fn with_dependency(mut self, coordinate: &str, entries: Vec<PathBuf>) -> Self {
        self.dependencies.insert(coordinate.to_string(), entries);
        self
    }

    pub fn with_include(mut self, reference: &str, entries: Vec<PathBuf>) -> Self {
        self.includes.insert(reference.to_string(), entries);
        self
    }
}

impl SessionExtender for RecordingExtender {
    fn add_dependency(&mut self, coordinate: &str) -> Result<Vec<PathBuf>> {
        match self.dependencies.get(coordinate) {
            Some(entries) => Ok(entries.clone()),
            None => bail!("{} not found", coordinate),
        }
    }

    fn add_include(&mut self, reference: &str) -> Result<Vec<PathBuf>> {
        match self.includes.get(reference) {
            Some(entries) => Ok(entries.clone()),
            None => bail!("{} not found", reference),
        }
    }
}
