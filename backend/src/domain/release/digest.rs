//! Content digest used as the download validator.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use super::ReleaseValidationError;

const DIGEST_HEX_LEN: usize = 40;

/// Lowercase hex SHA-1 of the bytes stored for a release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Validate a 40 character hex digest. Uppercase input is normalised.
    pub fn parse(value: &str) -> Result<Self, ReleaseValidationError> {
        if value.len() != DIGEST_HEX_LEN || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ReleaseValidationError::InvalidDigest {
                value: value.to_owned(),
            });
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Take the final state of a running hasher.
    #[must_use]
    pub fn from_hasher(hasher: Sha1) -> Self {
        Self(hex::encode(hasher.finalize()))
    }

    /// Digest of an in-memory buffer.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha1::digest(bytes)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = ReleaseValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentDigest> for String {
    fn from(value: ContentDigest) -> Self {
        value.0
    }
}
