//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use backend::domain::{ArchitectureSet, DEFAULT_UPLOAD_BUFFER_CHUNKS, RepositoryLayout};
use backend::outbound::persistence::JsonLinesReleaseStore;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) layout: RepositoryLayout,
    pub(crate) architectures: ArchitectureSet,
    pub(crate) upload_buffer_chunks: usize,
    pub(crate) store: Arc<JsonLinesReleaseStore>,
}

impl ServerConfig {
    /// Configuration serving `store`, with artifacts under `data_dir`.
    ///
    /// The store should already be loaded; until it is, release routes
    /// answer `503`.
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        data_dir: impl Into<PathBuf>,
        store: Arc<JsonLinesReleaseStore>,
    ) -> Self {
        Self {
            bind_addr,
            layout: RepositoryLayout::new(data_dir.into()),
            architectures: ArchitectureSet::default(),
            upload_buffer_chunks: DEFAULT_UPLOAD_BUFFER_CHUNKS,
            store,
        }
    }

    #[must_use]
    pub fn with_architectures(mut self, architectures: ArchitectureSet) -> Self {
        self.architectures = architectures;
        self
    }

    #[must_use]
    pub fn with_upload_buffer_chunks(mut self, chunks: usize) -> Self {
        self.upload_buffer_chunks = chunks;
        self
    }
}
