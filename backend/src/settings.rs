//! Server settings loaded via OrthoConfig.
//!
//! Values layer CLI flags over `RELEASES_*` environment variables over an
//! optional config file. Accessors apply defaults and validation so `main`
//! can fail fast on bad input.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{ArchitectureSet, DEFAULT_UPLOAD_BUFFER_CHUNKS, ReleaseValidationError};

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Configuration for the release server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RELEASES")]
pub struct ReleaseServerSettings {
    /// Root holding `data.db` and the `repository/` tree.
    pub data_dir: Option<PathBuf>,
    /// Interface to bind.
    pub host: Option<String>,
    /// Port to bind.
    pub port: Option<u16>,
    /// Comma separated architectures accepted on upload.
    pub architectures: Option<String>,
    /// Chunks buffered per upload between reader, hasher and writer.
    pub upload_buffer_chunks: Option<usize>,
}

impl ReleaseServerSettings {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// Resolve the listen address.
    ///
    /// # Errors
    /// Returns an error when the host does not resolve.
    pub fn bind_addr(&self) -> io::Result<SocketAddr> {
        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        let port = self.port.unwrap_or(DEFAULT_PORT);
        (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("host {host} resolved to no addresses"),
            )
        })
    }

    /// Allowed upload architectures; `x86, arm64` unless configured.
    ///
    /// # Errors
    /// Rejects unknown names and an empty list.
    pub fn architectures(&self) -> Result<ArchitectureSet, ReleaseValidationError> {
        self.architectures
            .as_deref()
            .map_or_else(|| Ok(ArchitectureSet::default()), str::parse)
    }

    pub fn upload_buffer_chunks(&self) -> usize {
        self.upload_buffer_chunks
            .unwrap_or(DEFAULT_UPLOAD_BUFFER_CHUNKS)
            .max(1)
    }
}
