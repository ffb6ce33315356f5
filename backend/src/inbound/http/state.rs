//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only see domain ports, so
//! they can be tested against fixtures or mocks without disk I/O.

use std::sync::Arc;

use crate::domain::ArchitectureSet;
use crate::domain::ports::{ReleaseCommand, ReleaseQuery};

/// Dependency bundle for release handlers.
#[derive(Clone)]
pub struct HttpState {
    pub releases: Arc<dyn ReleaseCommand>,
    pub releases_query: Arc<dyn ReleaseQuery>,
    /// Architectures accepted on upload; used to reject form fields early.
    pub architectures: ArchitectureSet,
}

impl HttpState {
    pub fn new(
        releases: Arc<dyn ReleaseCommand>,
        releases_query: Arc<dyn ReleaseQuery>,
        architectures: ArchitectureSet,
    ) -> Self {
        Self {
            releases,
            releases_query,
            architectures,
        }
    }
}
