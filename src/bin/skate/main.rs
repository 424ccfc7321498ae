//! Skate CLI - run Kotlin scripts that declare their own dependencies

use std::io::IsTerminal;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use skate::resolver::ResolveError;
use skate::util::diagnostic;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            report(&e);
            1
        }
    };
    std::process::exit(code);
}

fn report(e: &anyhow::Error) {
    match e.downcast_ref::<ResolveError>() {
        Some(resolve) => diagnostic::emit(&resolve.to_diagnostic(), std::io::stderr().is_terminal()),
        None => eprintln!("error: {:#}", e),
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("skate=debug")
    } else {
        EnvFilter::new("skate=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global = cli.global();
    match cli.command {
        Some(Commands::Tree(args)) => commands::tree::execute(global, args),
        Some(Commands::Cache(args)) => commands::cache::execute(global, args),
        Some(Commands::Completions(args)) => commands::completions::execute(args),
        None if cli.run.file.is_none() => {
            Cli::command().print_help()?;
            Ok(0)
        }
        None => commands::run::execute(global, cli.run),
    }
}
