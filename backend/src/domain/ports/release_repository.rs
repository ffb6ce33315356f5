//! Port for durable release record storage.

use async_trait::async_trait;

use crate::domain::filter::ReleasePredicate;
use crate::domain::{Release, ReleaseId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by release store adapters.
    pub enum ReleaseRepositoryError {
        /// The store was used before its startup load completed.
        NotInitialized => "release store has not been loaded",
        /// A record with the same primary key already exists.
        DuplicateId { id: String } => "release {id} already exists",
        /// Reading or appending the backing file failed.
        Io { message: String } => "release store I/O failed: {message}",
        /// The backing file holds data that cannot be decoded.
        Corrupt { message: String } => "release store is corrupt: {message}",
    }
}

/// Field a listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Date,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Ordering and truncation applied to [`ReleaseRepository::find`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort_by: SortKey,
    pub direction: SortDirection,
    /// Applied after sorting.
    pub limit: Option<usize>,
}

/// Port for inserting and querying release records.
///
/// Implementations must tolerate concurrent inserts and reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseRepository: Send + Sync {
    /// Persist a new record. Fails with `DuplicateId` if the id is taken.
    async fn insert(&self, release: &Release) -> Result<(), ReleaseRepositoryError>;

    /// Look up one record by primary key.
    async fn find_by_id(&self, id: &ReleaseId) -> Result<Option<Release>, ReleaseRepositoryError>;

    /// Records matching `predicate`, ordered and truncated per `options`.
    async fn find(
        &self,
        predicate: &ReleasePredicate,
        options: FindOptions,
    ) -> Result<Vec<Release>, ReleaseRepositoryError>;
}

/// Fixture implementation for tests that do not exercise persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureReleaseRepository;

#[async_trait]
impl ReleaseRepository for FixtureReleaseRepository {
    async fn insert(&self, _release: &Release) -> Result<(), ReleaseRepositoryError> {
        Ok(())
    }

    async fn find_by_id(
        &self,
        _id: &ReleaseId,
    ) -> Result<Option<Release>, ReleaseRepositoryError> {
        Ok(None)
    }

    async fn find(
        &self,
        _predicate: &ReleasePredicate,
        _options: FindOptions,
    ) -> Result<Vec<Release>, ReleaseRepositoryError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_repository_is_empty() {
        let repo = FixtureReleaseRepository;
        let found = repo
            .find(&ReleasePredicate::all(), FindOptions::default())
            .await
            .expect("fixture find succeeds");
        assert!(found.is_empty());
        assert!(
            repo.find_by_id(&ReleaseId::generate())
                .await
                .expect("fixture lookup succeeds")
                .is_none()
        );
    }

    #[test]
    fn default_options_sort_by_date_ascending_without_limit() {
        let options = FindOptions::default();
        assert_eq!(options.sort_by, SortKey::Date);
        assert_eq!(options.direction, SortDirection::Ascending);
        assert_eq!(options.limit, None);
    }

    #[test]
    fn error_messages_name_the_failure() {
        assert_eq!(
            ReleaseRepositoryError::duplicate_id("abc").to_string(),
            "release abc already exists"
        );
        assert_eq!(
            ReleaseRepositoryError::not_initialized().to_string(),
            "release store has not been loaded"
        );
    }
}
