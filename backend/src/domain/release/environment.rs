//! Build environment a release targets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ReleaseValidationError;

/// Operating system an artifact was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    Windows,
    Linux,
    Osx,
}

impl OperatingSystem {
    /// Wire name used in JSON, query strings and form fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Osx => "osx",
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatingSystem {
    type Err = ReleaseValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "osx" => Ok(Self::Osx),
            other => Err(ReleaseValidationError::UnknownOperatingSystem {
                value: other.to_owned(),
            }),
        }
    }
}

/// CPU architecture an artifact was built for.
///
/// Every known architecture can be parsed and stored; which ones are accepted
/// for new uploads is decided by an [`ArchitectureSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    X86,
    Arm,
    Arm64,
}

impl Architecture {
    /// Wire name used in JSON, query strings and form fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = ReleaseValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "x86" => Ok(Self::X86),
            "arm" => Ok(Self::Arm),
            "arm64" => Ok(Self::Arm64),
            other => Err(ReleaseValidationError::UnknownArchitecture {
                value: other.to_owned(),
            }),
        }
    }
}

/// Closed set of architectures accepted at ingestion.
///
/// # Examples
/// ```
/// use backend::domain::{Architecture, ArchitectureSet};
///
/// let allowed: ArchitectureSet = "x86, arm64".parse().unwrap();
/// assert!(allowed.contains(Architecture::Arm64));
/// assert!(!allowed.contains(Architecture::Arm));
/// assert_eq!(allowed.to_string(), "x86, arm64");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchitectureSet(Vec<Architecture>);

impl ArchitectureSet {
    /// Build a set from the given architectures, dropping duplicates.
    pub fn new(
        architectures: impl IntoIterator<Item = Architecture>,
    ) -> Result<Self, ReleaseValidationError> {
        let mut members: Vec<Architecture> = architectures.into_iter().collect();
        members.sort_unstable();
        members.dedup();
        if members.is_empty() {
            return Err(ReleaseValidationError::EmptyArchitectureSet);
        }
        Ok(Self(members))
    }

    #[must_use]
    pub fn contains(&self, architecture: Architecture) -> bool {
        self.0.contains(&architecture)
    }

    /// Members in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = Architecture> + '_ {
        self.0.iter().copied()
    }

    /// Reject architectures outside the set.
    pub fn check(&self, architecture: Architecture) -> Result<(), ReleaseValidationError> {
        if self.contains(architecture) {
            return Ok(());
        }
        Err(self.unsupported(architecture.as_str()))
    }

    /// Parse a raw wire value and check membership in one step.
    ///
    /// Unknown names and known-but-disallowed names produce the same error so
    /// callers always see the configured list.
    pub fn parse_member(&self, value: &str) -> Result<Architecture, ReleaseValidationError> {
        match value.parse::<Architecture>() {
            Ok(architecture) if self.contains(architecture) => Ok(architecture),
            _ => Err(self.unsupported(value)),
        }
    }

    fn unsupported(&self, value: &str) -> ReleaseValidationError {
        ReleaseValidationError::UnsupportedArchitecture {
            value: value.to_owned(),
            allowed: self.to_string(),
        }
    }
}

impl Default for ArchitectureSet {
    fn default() -> Self {
        Self(vec![Architecture::X86, Architecture::Arm64])
    }
}

impl fmt::Display for ArchitectureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for architecture in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(architecture.as_str())?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for ArchitectureSet {
    type Err = ReleaseValidationError;

    /// Parse a comma separated list such as `x86,arm64`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let members = value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::parse::<Architecture>)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(members)
    }
}

/// Target platform of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub operating_system: OperatingSystem,
    pub architecture: Architecture,
}
