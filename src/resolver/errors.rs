//! Resolution error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error while resolving a script into a unit.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ResolveError {
    #[error("could not read script `{}`", path.display())]
    #[diagnostic(code(skate::manifest))]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cyclic include detected")]
    #[diagnostic(code(skate::cycle), help("remove one of the @file:Import directives in the cycle"))]
    CyclicInclude { cycle: Vec<PathBuf> },

    #[error("malformed version constraint in `{coordinate}`")]
    #[diagnostic(code(skate::constraint))]
    MalformedConstraint { coordinate: String },

    #[error("no version of `{coordinate}` matches `{range}`")]
    #[diagnostic(code(skate::version))]
    VersionResolution { coordinate: String, range: String },

    #[error("refusing to fetch `{url}` over an insecure connection")]
    #[diagnostic(code(skate::insecure), help("use an https:// URL"))]
    InsecureSource { url: String },

    #[error("failed to fetch `{url}`: {reason}")]
    #[diagnostic(code(skate::fetch))]
    RemoteFetch { url: String, reason: String },

    #[error("could not resolve artifact `{coordinate}`: {reason}")]
    #[diagnostic(code(skate::artifact))]
    ArtifactNotFound { coordinate: String, reason: String },

    #[error("invalid coordinate `{coordinate}`")]
    #[diagnostic(
        code(skate::coordinate),
        help("coordinates look like group:artifact:version")
    )]
    InvalidCoordinate { coordinate: String },

    #[error("I/O error at `{}`", path.display())]
    #[diagnostic(code(skate::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ResolveError::Io {
            path: path.into(),
            source,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::ManifestParse { path, source } => {
                Diagnostic::error(format!("could not read script: {}", source))
                    .with_location(path.clone())
            }

            ResolveError::CyclicInclude { cycle } => {
                let chain = cycle
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                Diagnostic::error("cyclic include detected")
                    .with_context(format!("cycle: {}", chain))
                    .with_suggestion("Remove one of the @file:Import directives in the cycle")
            }

            ResolveError::MalformedConstraint { coordinate } => {
                Diagnostic::error(format!("malformed version constraint in `{}`", coordinate))
                    .with_suggestion("Use an exact version, `1.2.+`, or a range like `[1.2,1.3)`")
            }

            ResolveError::VersionResolution { coordinate, range } => Diagnostic::error(format!(
                "no published version of `{}` matches `{}`",
                coordinate, range
            ))
            .with_suggestion(suggestions::ADD_REPOSITORY),

            ResolveError::InsecureSource { url } => {
                Diagnostic::error(format!("refusing to fetch `{}`", url))
                    .with_context("remote includes must be fetched over https")
                    .with_suggestion(suggestions::USE_HTTPS)
            }

            ResolveError::RemoteFetch { url, reason } => {
                Diagnostic::error(format!("failed to fetch `{}`", url))
                    .with_context(reason.clone())
                    .with_suggestion(suggestions::FETCH_FAILED)
            }

            ResolveError::ArtifactNotFound { coordinate, reason } => {
                Diagnostic::error(format!("could not resolve `{}`", coordinate))
                    .with_context(reason.clone())
                    .with_suggestion(suggestions::ADD_REPOSITORY)
                    .with_suggestion(suggestions::RUN_VERBOSE)
            }

            ResolveError::InvalidCoordinate { coordinate } => {
                Diagnostic::error(format!("invalid coordinate `{}`", coordinate))
                    .with_suggestion("Coordinates look like `group:artifact:version`")
            }

            ResolveError::Io { path, source } => {
                Diagnostic::error(format!("I/O error: {}", source)).with_location(path.clone())
            }
        }
    }
}
