//! Skate - run Kotlin scripts that declare their own dependencies.
//!
//! A script names Maven repositories, library coordinates and other source
//! files through `@file:` directives. This crate resolves the directive
//! graph into a single compilation unit, compiles it, and runs it, evaluates
//! one line against it, or opens an interactive loop on it.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod runtime;
pub mod sources;
pub mod util;

/// Test doubles for the network, artifact resolution, compilation and
/// evaluation.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests.
#[cfg(test)]
pub mod test_support;

pub use core::{Coordinate, Library, Manifest, Repository, ResolvedUnit};
pub use resolver::{ResolveError, UnitResolver};
pub use runtime::LoadingSession;
pub use util::context::GlobalContext;
