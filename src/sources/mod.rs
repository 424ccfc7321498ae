//! Artifact and source providers.
//!
//! Sources are responsible for fetching what a script refers to: remote
//! include files (through the remote source cache) and Maven artifacts
//! (through an artifact resolver).

pub mod http;
pub mod maven;
pub mod remote;

pub use http::{HttpFetcher, HttpResponse, ReqwestFetcher};
pub use maven::MavenResolver;
pub use remote::{CacheEntry, RemoteSourceCache};

use crate::core::{Coordinate, Library, Repository};
use crate::resolver::errors::ResolveError;

/// Resolves a concrete coordinate to the libraries backing it.
pub trait ArtifactResolver {
    /// The first library is the requested artifact; its transitive runtime
    /// dependencies follow in a stable order.
    fn resolve_libraries(
        &self,
        coordinate: &Coordinate,
        repositories: &[Repository],
    ) -> Result<Vec<Library>, ResolveError>;
}

/// Lists every published version of an artifact.
pub trait VersionLister {
    fn list_versions(
        &self,
        group: &str,
        artifact: &str,
        repositories: &[Repository],
    ) -> Result<Vec<String>, ResolveError>;
}
