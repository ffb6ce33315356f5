//! On-disk shape of a release record.
//!
//! One document per line. The primary key is stored as `_id` and dates are
//! written as RFC 3339 strings. NeDB encodes every date, nested ones
//! included, as `{"$$date": millis}`; that form is accepted on read so
//! existing data files load unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ContentDigest, Environment, Release, ReleaseDraft, ReleaseFile, ReleaseId, ReleaseMetadata,
    ReleaseType,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ReleaseDocument {
    #[serde(rename = "_id")]
    pub(super) id: ReleaseId,
    pub(super) date: StoredDate,
    pub(super) environment: Environment,
    #[serde(rename = "type")]
    pub(super) release_type: ReleaseType,
    pub(super) file: ReleaseFile,
    pub(super) sha1: ContentDigest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) metadata: Option<MetadataDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MetadataDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    changelog: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    commit_sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    build_date: Option<StoredDate>,
}

impl From<&ReleaseMetadata> for MetadataDocument {
    fn from(metadata: &ReleaseMetadata) -> Self {
        Self {
            version: metadata.version.clone(),
            name: metadata.name.clone(),
            changelog: metadata.changelog.clone(),
            commit_sha: metadata.commit_sha.clone(),
            build_date: metadata.build_date.map(StoredDate::Rfc3339),
        }
    }
}

impl MetadataDocument {
    fn into_metadata(self) -> Option<ReleaseMetadata> {
        let build_date = match self.build_date {
            Some(stored) => Some(stored.to_utc()?),
            None => None,
        };
        Some(ReleaseMetadata {
            version: self.version,
            name: self.name,
            changelog: self.changelog,
            commit_sha: self.commit_sha,
            build_date,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub(super) enum StoredDate {
    Rfc3339(DateTime<Utc>),
    Nedb {
        #[serde(rename = "$$date")]
        millis: i64,
    },
}

impl StoredDate {
    fn to_utc(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Rfc3339(date) => Some(date),
            Self::Nedb { millis } => DateTime::from_timestamp_millis(millis),
        }
    }
}

impl From<&Release> for ReleaseDocument {
    fn from(release: &Release) -> Self {
        Self {
            id: release.id().clone(),
            date: StoredDate::Rfc3339(release.date()),
            environment: release.environment(),
            release_type: release.release_type(),
            file: release.file().clone(),
            sha1: release.sha1().clone(),
            metadata: release.metadata().map(MetadataDocument::from),
        }
    }
}

impl TryFrom<ReleaseDocument> for Release {
    type Error = String;

    fn try_from(document: ReleaseDocument) -> Result<Self, Self::Error> {
        let date = document
            .date
            .to_utc()
            .ok_or_else(|| format!("release {} has an out of range date", document.id))?;
        let metadata = document
            .metadata
            .map(|metadata| {
                metadata.into_metadata().ok_or_else(|| {
                    format!("release {} has an out of range build date", document.id)
                })
            })
            .transpose()?;
        Ok(Self::from(ReleaseDraft {
            id: document.id,
            date,
            environment: document.environment,
            release_type: document.release_type,
            file: document.file,
            sha1: document.sha1,
            metadata,
        }))
    }
}
