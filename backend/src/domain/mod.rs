//! Domain primitives, services and ports.
//!
//! Purpose: hold everything that defines how releases are ingested, stored and
//! served without reference to HTTP or the concrete store.
//!
//! Public surface:
//! - Error / ErrorCode: transport agnostic failure payload.
//! - Release and its value types: the persisted record.
//! - RepositoryLayout: content-addressed artifact paths.
//! - filter: listing criteria and the predicate they compile to.
//! - ReleaseIngestionService / ReleaseQueryService: driving port implementations.

pub mod error;
pub mod filter;
pub mod ingestion;
pub mod layout;
pub mod ports;
pub mod release;
pub mod retrieval;
mod store_errors;
pub mod trace_id;

pub use self::error::{Error, ErrorCode};
pub use self::ingestion::{DEFAULT_UPLOAD_BUFFER_CHUNKS, ReleaseIngestionService};
pub use self::layout::RepositoryLayout;
pub use self::release::{
    Architecture, ArchitectureSet, ContentDigest, Environment, OperatingSystem, Release,
    ReleaseDraft, ReleaseFile, ReleaseId, ReleaseMetadata, ReleaseType, ReleaseValidationError,
};
pub use self::retrieval::{MAX_LIST_RESULTS, ReleaseQueryService};
pub use self::trace_id::TraceId;

/// Convenient API result alias.
pub type ApiResult<T> = Result<T, Error>;
