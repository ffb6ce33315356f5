//! Release record: the single persisted entity.
//!
//! A [`Release`] is assembled once by the ingestion service after its
//! artifact is on disk and never changes afterwards.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::domain::Error;

mod digest;
mod environment;
mod kind;
mod metadata;

pub use digest::ContentDigest;
pub use environment::{Architecture, ArchitectureSet, Environment, OperatingSystem};
pub use kind::ReleaseType;
pub use metadata::ReleaseMetadata;

const RELEASE_ID_HEX_LEN: usize = 32;

/// Validation failures for release values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReleaseValidationError {
    #[error("release id must be 32 hexadecimal characters, got {value:?}")]
    InvalidId { value: String },
    #[error("sha1 must be 40 hexadecimal characters, got {value:?}")]
    InvalidDigest { value: String },
    #[error("unknown operating system {value:?}")]
    UnknownOperatingSystem { value: String },
    #[error("unknown architecture {value:?}")]
    UnknownArchitecture { value: String },
    #[error("architecture must be one of: {allowed}")]
    UnsupportedArchitecture { value: String, allowed: String },
    #[error("unknown release type {value:?}")]
    UnknownReleaseType { value: String },
    #[error("at least one architecture must be allowed")]
    EmptyArchitectureSet,
    #[error("file name must not be blank")]
    BlankFileName,
    #[error("buildDate {build_date} is in the future")]
    BuildDateInFuture { build_date: DateTime<Utc> },
}

impl ReleaseValidationError {
    /// Wire name of the offending field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidId { .. } => "id",
            Self::InvalidDigest { .. } => "sha1",
            Self::UnknownOperatingSystem { .. } => "operatingSystem",
            Self::UnknownArchitecture { .. } | Self::UnsupportedArchitecture { .. } => {
                "architecture"
            }
            Self::UnknownReleaseType { .. } => "type",
            Self::EmptyArchitectureSet => "architectures",
            Self::BlankFileName => "file",
            Self::BuildDateInFuture { .. } => "buildDate",
        }
    }

    /// Stable machine-readable reason.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidId { .. } | Self::InvalidDigest { .. } => "malformed",
            Self::UnknownOperatingSystem { .. }
            | Self::UnknownArchitecture { .. }
            | Self::UnknownReleaseType { .. } => "unknown_value",
            Self::UnsupportedArchitecture { .. } => "unsupported_value",
            Self::EmptyArchitectureSet | Self::BlankFileName => "empty",
            Self::BuildDateInFuture { .. } => "future_date",
        }
    }

    fn details(&self) -> Value {
        let mut details = Map::new();
        details.insert("field".to_owned(), json!(self.field()));
        details.insert("code".to_owned(), json!(self.code()));
        match self {
            Self::InvalidId { value }
            | Self::InvalidDigest { value }
            | Self::UnknownOperatingSystem { value }
            | Self::UnknownArchitecture { value }
            | Self::UnknownReleaseType { value } => {
                details.insert("value".to_owned(), json!(value));
            }
            Self::UnsupportedArchitecture { value, allowed } => {
                details.insert("value".to_owned(), json!(value));
                details.insert("allowed".to_owned(), json!(allowed));
            }
            Self::BuildDateInFuture { build_date } => {
                details.insert("value".to_owned(), json!(build_date.to_rfc3339()));
            }
            Self::EmptyArchitectureSet | Self::BlankFileName => {}
        }
        Value::Object(details)
    }
}

impl From<ReleaseValidationError> for Error {
    fn from(err: ReleaseValidationError) -> Self {
        Self::invalid_request(err.to_string()).with_details(err.details())
    }
}

/// Primary key of a release: 128 random bits as 32 lowercase hex characters.
///
/// # Examples
/// ```
/// use backend::domain::ReleaseId;
///
/// let id = ReleaseId::parse("0123456789ABCDEF0123456789abcdef").unwrap();
/// assert_eq!(id.as_str(), "0123456789abcdef0123456789abcdef");
/// assert!(ReleaseId::parse("../etc/passwd").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReleaseId(String);

impl ReleaseId {
    /// Fresh identifier from a v4 UUID rendered without hyphens.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Validate an identifier received from outside the process.
    pub fn parse(value: &str) -> Result<Self, ReleaseValidationError> {
        if value.len() != RELEASE_ID_HEX_LEN || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ReleaseValidationError::InvalidId {
                value: value.to_owned(),
            });
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ReleaseId {
    type Error = ReleaseValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReleaseId> for String {
    fn from(value: ReleaseId) -> Self {
        value.0
    }
}

/// Name and persisted size of the uploaded artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseFile {
    pub name: String,
    /// Bytes written to disk.
    pub size: u64,
}

/// Stored build artifact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ReleaseDraft")]
pub struct Release {
    id: ReleaseId,
    date: DateTime<Utc>,
    environment: Environment,
    #[serde(rename = "type")]
    release_type: ReleaseType,
    file: ReleaseFile,
    sha1: ContentDigest,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<ReleaseMetadata>,
}

/// Field-by-field input for [`Release`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseDraft {
    pub id: ReleaseId,
    pub date: DateTime<Utc>,
    pub environment: Environment,
    #[serde(rename = "type")]
    pub release_type: ReleaseType,
    pub file: ReleaseFile,
    pub sha1: ContentDigest,
    #[serde(default)]
    pub metadata: Option<ReleaseMetadata>,
}

impl From<ReleaseDraft> for Release {
    fn from(draft: ReleaseDraft) -> Self {
        Self {
            id: draft.id,
            date: draft.date,
            environment: draft.environment,
            release_type: draft.release_type,
            file: draft.file,
            sha1: draft.sha1,
            metadata: draft.metadata.and_then(ReleaseMetadata::into_option),
        }
    }
}

impl Release {
    #[must_use]
    pub const fn id(&self) -> &ReleaseId {
        &self.id
    }

    /// Creation time; also selects the day bucket on disk.
    #[must_use]
    pub const fn date(&self) -> DateTime<Utc> {
        self.date
    }

    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.environment
    }

    #[must_use]
    pub const fn release_type(&self) -> ReleaseType {
        self.release_type
    }

    #[must_use]
    pub const fn file(&self) -> &ReleaseFile {
        &self.file
    }

    #[must_use]
    pub const fn sha1(&self) -> &ContentDigest {
        &self.sha1
    }

    #[must_use]
    pub const fn metadata(&self) -> Option<&ReleaseMetadata> {
        self.metadata.as_ref()
    }
}
