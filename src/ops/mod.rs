//! High-level operations.
//!
//! This module contains the implementation of Skate commands.

pub mod cache;
pub mod environment;
pub mod project;
pub mod prompt;
pub mod skate_run;
pub mod tree;

pub use cache::{clean as clean_cache, list as list_cache, CleanOptions};
pub use environment::Environment;
pub use project::{edit, project};
pub use prompt::{ensure_file_exists, ensure_file_exists_interactive};
pub use skate_run::{run, RunMode, RunOptions};
pub use tree::{tree, TreeOptions};
