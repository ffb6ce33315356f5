//! Release lookup, listing and conditional download.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

use crate::domain::filter::{ReleaseFilter, compile};
use crate::domain::ports::{
    DownloadOutcome, DownloadReleaseRequest, FindOptions, ReleaseContent, ReleaseQuery,
    ReleaseRepository, SortDirection, SortKey,
};
use crate::domain::store_errors::map_repository_error;
use crate::domain::{Error, Release, ReleaseId, RepositoryLayout};

/// Hard cap on the number of releases a listing returns.
pub const MAX_LIST_RESULTS: usize = 1000;

/// Domain service implementing [`ReleaseQuery`].
#[derive(Clone)]
pub struct ReleaseQueryService<R> {
    repository: Arc<R>,
    layout: RepositoryLayout,
}

impl<R> ReleaseQueryService<R> {
    pub const fn new(repository: Arc<R>, layout: RepositoryLayout) -> Self {
        Self { repository, layout }
    }
}

impl<R> ReleaseQueryService<R>
where
    R: ReleaseRepository,
{
    async fn find(&self, raw_id: &str) -> Result<Release, Error> {
        // A malformed id cannot name a stored release.
        let id = ReleaseId::parse(raw_id)
            .map_err(|_| Error::not_found(format!("release {raw_id} not found")))?;
        self.repository
            .find_by_id(&id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("release {id} not found")))
    }
}

#[async_trait]
impl<R> ReleaseQuery for ReleaseQueryService<R>
where
    R: ReleaseRepository,
{
    async fn get_release(&self, id: &str) -> Result<Release, Error> {
        self.find(id).await
    }

    async fn list_releases(&self, filter: ReleaseFilter) -> Result<Vec<Release>, Error> {
        let predicate = compile(&filter);
        let options = FindOptions {
            sort_by: SortKey::Date,
            direction: SortDirection::Ascending,
            limit: Some(MAX_LIST_RESULTS),
        };
        self.repository
            .find(&predicate, options)
            .await
            .map_err(map_repository_error)
    }

    async fn download_release(
        &self,
        request: DownloadReleaseRequest,
    ) -> Result<DownloadOutcome, Error> {
        let release = self.find(&request.id).await?;

        if request.if_none_match.matches(release.sha1()) {
            debug!(release_id = %release.id(), "client copy is current");
            return Ok(DownloadOutcome::NotModified {
                digest: release.sha1().clone(),
            });
        }

        let path = self.layout.resolve(release.id(), release.date());
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                error!(
                    release_id = %release.id(),
                    path = %path.display(),
                    "artifact missing for stored release"
                );
                return Err(Error::internal(format!(
                    "artifact for release {} is missing",
                    release.id()
                )));
            }
            Err(err) => {
                return Err(Error::internal(format!(
                    "failed to open artifact for release {}: {err}",
                    release.id()
                )));
            }
        };

        Ok(DownloadOutcome::Content(ReleaseContent {
            release,
            body: ReaderStream::new(file).boxed(),
        }))
    }
}

#[cfg(test)]
#[path = "retrieval_tests.rs"]
mod tests;
