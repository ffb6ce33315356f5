//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod release_command;
mod release_query;
mod release_repository;

#[cfg(test)]
pub use release_command::MockReleaseCommand;
pub use release_command::{ByteStream, FixtureReleaseCommand, IngestReleaseRequest, ReleaseCommand};
#[cfg(test)]
pub use release_query::MockReleaseQuery;
pub use release_query::{
    DownloadOutcome, DownloadReleaseRequest, FixtureReleaseQuery, IfNoneMatch, ReleaseContent,
    ReleaseQuery,
};
#[cfg(test)]
pub use release_repository::MockReleaseRepository;
pub use release_repository::{
    FindOptions, FixtureReleaseRepository, ReleaseRepository, ReleaseRepositoryError,
    SortDirection, SortKey,
};
