//! Release ingestion service.
//!
//! Order of effects for one upload:
//! - validate the request against the configured architectures and clock;
//! - capture the id and creation date once;
//! - create the day bucket directory;
//! - stream the body to disk while hashing it;
//! - insert the record, removing the artifact again if the insert fails.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tokio::fs;
use tracing::{info, warn};

use crate::domain::ports::{IngestReleaseRequest, ReleaseCommand, ReleaseRepository};
use crate::domain::store_errors::map_repository_error;
use crate::domain::{
    ArchitectureSet, Error, Release, ReleaseDraft, ReleaseFile, ReleaseId, ReleaseValidationError,
    RepositoryLayout,
};

mod fan_out;

use fan_out::{UploadError, persist_upload};

/// Default number of chunks buffered per consumer.
pub const DEFAULT_UPLOAD_BUFFER_CHUNKS: usize = 8;

/// Domain service implementing [`ReleaseCommand`].
#[derive(Clone)]
pub struct ReleaseIngestionService<R> {
    repository: Arc<R>,
    layout: RepositoryLayout,
    architectures: ArchitectureSet,
    clock: Arc<dyn Clock>,
    buffer_chunks: usize,
}

impl<R> ReleaseIngestionService<R> {
    pub fn new(
        repository: Arc<R>,
        layout: RepositoryLayout,
        architectures: ArchitectureSet,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            layout,
            architectures,
            clock,
            buffer_chunks: DEFAULT_UPLOAD_BUFFER_CHUNKS,
        }
    }

    /// Override the per-consumer channel capacity. Zero is raised to one.
    #[must_use]
    pub fn with_buffer_chunks(mut self, chunks: usize) -> Self {
        self.buffer_chunks = chunks.max(1);
        self
    }

    fn validate(&self, request: &IngestReleaseRequest) -> Result<(), Error> {
        self.architectures
            .check(request.environment.architecture)?;
        if request.file_name.trim().is_empty() {
            return Err(ReleaseValidationError::BlankFileName.into());
        }
        request.metadata.validate_at(self.clock.utc())?;
        Ok(())
    }
}

#[async_trait]
impl<R> ReleaseCommand for ReleaseIngestionService<R>
where
    R: ReleaseRepository,
{
    async fn ingest(&self, request: IngestReleaseRequest) -> Result<Release, Error> {
        self.validate(&request)?;

        let id = ReleaseId::generate();
        let date = self.clock.utc();
        let target = self.layout.resolve(&id, date);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|err| {
                Error::internal(format!(
                    "failed to create {}: {err}",
                    parent.display()
                ))
            })?;
        }

        let IngestReleaseRequest {
            environment,
            release_type,
            metadata,
            file_name,
            declared_size,
            body,
        } = request;

        let persisted = persist_upload(body, &target, declared_size, self.buffer_chunks)
            .await
            .map_err(|err| map_upload_error(&id, err))?;

        let release = Release::from(ReleaseDraft {
            id,
            date,
            environment,
            release_type,
            file: ReleaseFile {
                name: file_name,
                size: persisted.size,
            },
            sha1: persisted.digest,
            metadata: Some(metadata),
        });

        if let Err(err) = self.repository.insert(&release).await {
            discard_artifact(&target).await;
            return Err(map_repository_error(err));
        }

        info!(
            release_id = %release.id(),
            sha1 = %release.sha1(),
            size = release.file().size,
            "release stored"
        );
        Ok(release)
    }
}

fn map_upload_error(id: &ReleaseId, err: UploadError) -> Error {
    match err {
        UploadError::Empty => Error::invalid_request("uploaded file is empty")
            .with_details(serde_json::json!({ "field": "file", "code": "empty" })),
        other => {
            warn!(release_id = %id, error = %other, "upload aborted");
            Error::internal(format!("upload failed: {other}"))
        }
    }
}

async fn discard_artifact(path: &Path) {
    if let Err(err) = fs::remove_file(path).await {
        warn!(path = %path.display(), error = %err, "failed to remove orphaned artifact");
    }
}
