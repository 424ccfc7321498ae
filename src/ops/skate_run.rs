//! Implementation of running a script: plain run, single action and the
//! interactive loop.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::{compile_unit, Compiler, Kotlinc};
use crate::core::{Repository, ResolvedUnit};
use crate::ops::environment::Environment;
use crate::runtime::jvm::{JvmProgram, KotlincEvaluator};
use crate::runtime::repl::{run_repl, ReplExit};
use crate::runtime::{
    invoke_entry_point, Evaluator, InvokeOutcome, LoadingSession, SessionExtender,
};
use crate::util::shell::Status;

pub const NO_ENTRY_POINT: &str = "Could not find main function.";

/// What to do with the compiled script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Call its entry point with the trailing arguments
    Run(Vec<String>),
    /// Evaluate one line against it
    Action(String),
    /// Start the interactive loop
    Interactive,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub file: PathBuf,
    pub mode: RunMode,
}

/// Resolve, compile and run. Returns the process exit code.
pub fn run(env: &Environment, opts: &RunOptions) -> Result<i32> {
    match &opts.mode {
        RunMode::Run(argv) => run_main(env, &opts.file, argv),
        RunMode::Action(line) => run_action(env, &opts.file, line),
        RunMode::Interactive => run_interactive(env, &opts.file),
    }
}

/// Resolve and compile, returning the unit and its loading session.
fn load(env: &Environment, kotlinc: &Kotlinc, file: &Path) -> Result<(ResolvedUnit, LoadingSession)> {
    let unit = env.resolve(file)?;
    let output = compile_unit(kotlinc, &unit, env.shell())?;
    let session = LoadingSession::for_unit(&unit, &output);
    Ok((unit, session))
}

fn run_main(env: &Environment, file: &Path, argv: &[String]) -> Result<i32> {
    let kotlinc = env.kotlinc()?;
    let (unit, session) = load(env, &kotlinc, file)?;

    let Some(program) = JvmProgram::for_unit(&unit, &env.java()?, kotlinc.program())? else {
        println!("{}", NO_ENTRY_POINT);
        return Ok(0);
    };

    env.shell().status(Status::Running, program.main_class());
    match invoke_entry_point(&program, &session, argv)? {
        InvokeOutcome::Completed(code) => Ok(code),
        InvokeOutcome::NoEntryPoint => {
            println!("{}", NO_ENTRY_POINT);
            Ok(0)
        }
    }
}

fn run_action(env: &Environment, file: &Path, line: &str) -> Result<i32> {
    let kotlinc = env.kotlinc()?;
    let (_unit, session) = load(env, &kotlinc, file)?;

    let mut evaluator = KotlincEvaluator::new(kotlinc.program());
    evaluator.prepare(&session)?;
    match evaluator.eval(&session, line) {
        Ok(value) => {
            if let Some(rendered) = value.render() {
                println!("{}", rendered);
            }
            Ok(0)
        }
        Err(e) => {
            println!("{}", e);
            Ok(1)
        }
    }
}

fn run_interactive(env: &Environment, file: &Path) -> Result<i32> {
    let kotlinc = env.kotlinc()?;
    let quiet = env.quieted();

    loop {
        let (unit, mut session) = load(env, &kotlinc, file)?;
        let mut evaluator = KotlincEvaluator::new(kotlinc.program());
        let mut extender = UnitExtender {
            env: &quiet,
            compiler: &kotlinc,
            base_dir: unit
                .file()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
            repositories: unit.repositories().to_vec(),
        };

        let stdin = io::stdin();
        let exit = run_repl(stdin.lock(), io::stdout(), &mut session, &mut evaluator, &mut extender)?;
        if exit == ReplExit::Quit {
            return Ok(0);
        }
        tracing::debug!("reloading {}", file.display());
    }
}

/// Extends a live session with dependencies and includes resolved
/// relative to the running script.
pub struct UnitExtender<'a> {
    env: &'a Environment,
    compiler: &'a dyn Compiler,
    base_dir: PathBuf,
    repositories: Vec<Repository>,
}

impl SessionExtender for UnitExtender<'_> {
    fn add_dependency(&mut self, coordinate: &str) -> Result<Vec<PathBuf>> {
        let libraries = self
            .env
            .resolver()?
            .resolve_dependency(coordinate, &self.repositories)?;
        Ok(libraries.into_iter().map(|lib| lib.primary).collect())
    }

    fn add_include(&mut self, reference: &str) -> Result<Vec<PathBuf>> {
        let unit = self
            .env
            .resolver()?
            .resolve_include(reference, &self.base_dir, &self.repositories)?;
        let output = compile_unit(self.compiler, &unit, self.env.shell())?;

        let mut entries: Vec<PathBuf> = unit.libraries().into_iter().map(|lib| lib.primary).collect();
        entries.push(output);
        Ok(entries)
    }
}
