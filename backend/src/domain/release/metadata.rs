//! Optional descriptive metadata attached to a release.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReleaseValidationError;

/// Free-form build information supplied by the uploader.
///
/// Every field is optional and absent fields are omitted from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_date: Option<DateTime<Utc>>,
}

impl ReleaseMetadata {
    /// True when no field carries a value.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.version.is_none()
            && self.name.is_none()
            && self.changelog.is_none()
            && self.commit_sha.is_none()
            && self.build_date.is_none()
    }

    /// Reject a build date later than `now`.
    pub fn validate_at(&self, now: DateTime<Utc>) -> Result<(), ReleaseValidationError> {
        match self.build_date {
            Some(build_date) if build_date > now => {
                Err(ReleaseValidationError::BuildDateInFuture { build_date })
            }
            _ => Ok(()),
        }
    }

    /// `None` when empty, so records never carry an empty metadata object.
    #[must_use]
    pub fn into_option(self) -> Option<Self> {
        (!self.is_empty()).then_some(self)
    }
}
