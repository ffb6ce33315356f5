//! Release channel.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ReleaseValidationError;

/// Channel a build was published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Nightly,
    Feature,
    Release,
}

impl ReleaseType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nightly => "nightly",
            Self::Feature => "feature",
            Self::Release => "release",
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseType {
    type Err = ReleaseValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "nightly" => Ok(Self::Nightly),
            "feature" => Ok(Self::Feature),
            "release" => Ok(Self::Release),
            other => Err(ReleaseValidationError::UnknownReleaseType {
                value: other.to_owned(),
            }),
        }
    }
}
