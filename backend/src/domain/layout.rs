//! Content-addressed placement of artifacts on disk.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::domain::ReleaseId;

const REPOSITORY_DIR: &str = "repository";
const ARTIFACT_EXTENSION: &str = "zip";
const PARTIAL_SUFFIX: &str = ".partial";

/// Maps `(id, creation date)` to the artifact path under the data directory.
///
/// Layout: `<data_dir>/repository/<YYYY-MM-DD>/<id>.zip`, with the day taken
/// in UTC. Resolution is pure: the same inputs always give the same path and
/// nothing touches the filesystem.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use backend::domain::{ReleaseId, RepositoryLayout};
/// use chrono::{TimeZone, Utc};
///
/// let layout = RepositoryLayout::new("/srv/releases");
/// let id = ReleaseId::parse("5f0c6ad2a1b84c48a1d1f3c2d4e5f607").unwrap();
/// let date = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 58).unwrap();
/// assert_eq!(
///     layout.resolve(&id, date),
///     Path::new("/srv/releases/repository/2024-03-09/5f0c6ad2a1b84c48a1d1f3c2d4e5f607.zip"),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLayout {
    repository_root: PathBuf,
}

impl RepositoryLayout {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            repository_root: data_dir.as_ref().join(REPOSITORY_DIR),
        }
    }

    /// Directory that holds every day bucket.
    #[must_use]
    pub fn repository_root(&self) -> &Path {
        &self.repository_root
    }

    #[must_use]
    pub fn resolve(&self, id: &ReleaseId, date: DateTime<Utc>) -> PathBuf {
        self.repository_root
            .join(day_bucket(date))
            .join(format!("{id}.{ARTIFACT_EXTENSION}"))
    }

    /// Sibling file that receives bytes while an upload is in flight.
    #[must_use]
    pub fn partial_path(path: &Path) -> PathBuf {
        let mut name = OsString::from(path.as_os_str());
        name.push(PARTIAL_SUFFIX);
        PathBuf::from(name)
    }
}

fn day_bucket(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}
