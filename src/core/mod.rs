//! Core data structures for Skate.
//!
//! - Coordinates and repositories for dependency resolution
//! - Manifests parsed from script directives
//! - Resolved libraries and units
//! - Deterministic workspace layout

pub mod coordinate;
pub mod library;
pub mod manifest;
pub mod repository;
pub mod stubs;
pub mod unit;
pub mod workspace;

pub use coordinate::Coordinate;
pub use library::Library;
pub use manifest::{Directive, IncludeRef, Manifest};
pub use repository::Repository;
pub use unit::ResolvedUnit;
pub use workspace::{WorkspaceLayout, WorkspacePaths};
