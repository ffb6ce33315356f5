//! Driving port for release ingestion.

use std::fmt;
use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;

use crate::domain::{
    ContentDigest, Environment, Error, Release, ReleaseDraft, ReleaseFile, ReleaseId,
    ReleaseMetadata, ReleaseType,
};

/// Chunked artifact bytes flowing into or out of the domain.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// One upload to ingest.
pub struct IngestReleaseRequest {
    pub environment: Environment,
    pub release_type: ReleaseType,
    pub metadata: ReleaseMetadata,
    /// Client supplied file name, kept for the download disposition.
    pub file_name: String,
    /// Size announced by the client, if any. Checked against bytes received.
    pub declared_size: Option<u64>,
    pub body: ByteStream,
}

impl fmt::Debug for IngestReleaseRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestReleaseRequest")
            .field("environment", &self.environment)
            .field("release_type", &self.release_type)
            .field("metadata", &self.metadata)
            .field("file_name", &self.file_name)
            .field("declared_size", &self.declared_size)
            .finish_non_exhaustive()
    }
}

/// Driving port for storing new releases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseCommand: Send + Sync {
    /// Persist the artifact, then register its record.
    ///
    /// No record exists unless the whole artifact reached disk.
    async fn ingest(&self, request: IngestReleaseRequest) -> Result<Release, Error>;
}

/// Fixture command that drains the body and echoes a record back.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureReleaseCommand;

#[async_trait]
impl ReleaseCommand for FixtureReleaseCommand {
    async fn ingest(&self, request: IngestReleaseRequest) -> Result<Release, Error> {
        let mut body = request.body;
        let mut bytes = Vec::new();
        while let Some(next) = body.next().await {
            let chunk = next.map_err(|err| Error::internal(err.to_string()))?;
            bytes.extend_from_slice(&chunk);
        }
        let size = u64::try_from(bytes.len())
            .map_err(|_| Error::internal("fixture upload exceeds supported size"))?;
        Ok(Release::from(ReleaseDraft {
            id: ReleaseId::generate(),
            date: chrono::Utc::now(),
            environment: request.environment,
            release_type: request.release_type,
            file: ReleaseFile {
                name: request.file_name,
                size,
            },
            sha1: ContentDigest::of(&bytes),
            metadata: Some(request.metadata),
        }))
    }
}
