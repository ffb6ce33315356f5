//! Driving port for release lookups, listings and downloads.

use std::fmt;

use async_trait::async_trait;

use crate::domain::filter::ReleaseFilter;
use crate::domain::{ContentDigest, Error, Release};

use super::ByteStream;

/// Client validators from an `If-None-Match` header, already unquoted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IfNoneMatch {
    #[default]
    Absent,
    /// `*`: matches any current representation.
    Any,
    Digests(Vec<String>),
}

impl IfNoneMatch {
    /// True when the stored digest satisfies the client's validators.
    #[must_use]
    pub fn matches(&self, digest: &ContentDigest) -> bool {
        match self {
            Self::Absent => false,
            Self::Any => true,
            Self::Digests(tags) => tags
                .iter()
                .any(|tag| tag.eq_ignore_ascii_case(digest.as_str())),
        }
    }
}

/// Request to stream a release artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReleaseRequest {
    /// Raw identifier from the caller; validated before any store access.
    pub id: String,
    pub if_none_match: IfNoneMatch,
}

/// Artifact bytes plus the record that describes them.
pub struct ReleaseContent {
    pub release: Release,
    pub body: ByteStream,
}

impl fmt::Debug for ReleaseContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseContent")
            .field("release", &self.release)
            .finish_non_exhaustive()
    }
}

/// Outcome of a conditional download.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The client already holds the current bytes.
    NotModified { digest: ContentDigest },
    Content(ReleaseContent),
}

/// Driving port for read access to releases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseQuery: Send + Sync {
    /// Fetch one release. Malformed ids are rejected before the store is read.
    async fn get_release(&self, id: &str) -> Result<Release, Error>;

    /// Releases matching `filter`, oldest first, capped at 1000.
    async fn list_releases(&self, filter: ReleaseFilter) -> Result<Vec<Release>, Error>;

    /// Resolve a download, honouring the client's validators.
    async fn download_release(
        &self,
        request: DownloadReleaseRequest,
    ) -> Result<DownloadOutcome, Error>;
}

/// Fixture query with no releases.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureReleaseQuery;

#[async_trait]
impl ReleaseQuery for FixtureReleaseQuery {
    async fn get_release(&self, id: &str) -> Result<Release, Error> {
        Err(Error::not_found(format!("release {id} not found")))
    }

    async fn list_releases(&self, _filter: ReleaseFilter) -> Result<Vec<Release>, Error> {
        Ok(Vec::new())
    }

    async fn download_release(
        &self,
        request: DownloadReleaseRequest,
    ) -> Result<DownloadOutcome, Error> {
        Err(Error::not_found(format!("release {} not found", request.id)))
    }
}
