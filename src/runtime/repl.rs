//! Interactive read-eval-print loop over a live loading session.

use std::io::{self, BufRead, Write};

use crate::runtime::{Evaluator, LoadingSession, SessionExtender};

pub const BANNER: &str = "Ready.  Type your commands below or type 'exit' to quit.";

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplExit {
    Quit,
    /// The caller should re-resolve the unit and start a fresh loop
    Reload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    Reload,
    DependsOn(String),
    Import(String),
    Eval(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Command<'a> {
        let token = line.split(' ').next().unwrap_or("");
        let token = token.split('(').next().unwrap_or("");
        match token {
            "exit" | ":q" | ":quit" => Command::Quit,
            ":reload" => Command::Reload,
            ":dependsOn" | "@file:DependsOn" | "@DependsOn" => {
                Command::DependsOn(directive_argument(line))
            }
            ":import" | "@file:Import" | "@Import" => Command::Import(directive_argument(line)),
            _ => Command::Eval(line),
        }
    }
}

/// Argument of a REPL directive: the quoted text for `@` forms, the rest
/// of the line for `:` forms.
pub fn directive_argument(line: &str) -> String {
    if line.starts_with('@') {
        match (line.find('"'), line.rfind('"')) {
            (Some(start), Some(end)) if end > start => line[start + 1..end].to_string(),
            _ => String::new(),
        }
    } else {
        line.split_once(' ')
            .map(|(_, rest)| rest.trim().to_string())
            .unwrap_or_default()
    }
}

/// Run the loop until a quit token, `:reload` or end of input.
///
/// Evaluation failures are printed and the loop continues. After every
/// extension attempt the evaluator is prepared again, whether or not the
/// extension succeeded.
pub fn run_repl<R: BufRead, W: Write>(
    input: R,
    mut out: W,
    session: &mut LoadingSession,
    evaluator: &mut dyn Evaluator,
    extender: &mut dyn SessionExtender,
) -> io::Result<ReplExit> {
    if let Err(e) = evaluator.prepare(session) {
        tracing::debug!("evaluator setup failed: {:#}", e);
    }

    writeln!(out, "{}", BANNER)?;
    out.flush()?;

    let mut lines = input.lines();
    loop {
        writeln!(out)?;
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next().transpose()? else {
            return Ok(ReplExit::Quit);
        };

        match Command::parse(&line) {
            Command::Quit => return Ok(ReplExit::Quit),
            Command::Reload => return Ok(ReplExit::Reload),
            Command::DependsOn(coordinate) => {
                match extender.add_dependency(&coordinate) {
                    Ok(entries) => {
                        session.extend(entries);
                        writeln!(out, "Successfully loaded {}.", coordinate)?;
                    }
                    Err(e) => writeln!(out, "Error: {:#}", e)?,
                }
                reprepare(evaluator, session);
            }
            Command::Import(reference) => {
                match extender.add_include(&reference) {
                    Ok(entries) => {
                        session.extend(entries);
                    }
                    Err(e) => writeln!(out, "Error: {:#}", e)?,
                }
                reprepare(evaluator, session);
            }
            Command::Eval(text) => match evaluator.eval(session, text) {
                Ok(value) => {
                    if let Some(rendered) = value.render() {
                        writeln!(out, "{}", rendered)?;
                    }
                }
                Err(e) => writeln!(out, "{}", e)?,
            },
        }
    }
}

fn reprepare(evaluator: &mut dyn Evaluator, session: &LoadingSession) {
    if let Err(e) = evaluator.prepare(session) {
        tracing::debug!("evaluator setup failed: {:#}", e);
    }
}
