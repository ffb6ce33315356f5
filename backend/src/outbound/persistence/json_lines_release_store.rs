//! Append-only JSON-lines release store.
//!
//! The whole data file is read into memory by [`JsonLinesReleaseStore::load`]
//! at startup. Inserts append one line, flush and `fsync` it, and only then
//! expose the record to readers.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::release_document::ReleaseDocument;
use crate::domain::filter::ReleasePredicate;
use crate::domain::ports::{
    FindOptions, ReleaseRepository, ReleaseRepositoryError, SortDirection, SortKey,
};
use crate::domain::{Release, ReleaseId};

/// Data file name inside the data directory.
pub const STORE_FILE_NAME: &str = "data.db";

struct Appender {
    file: File,
    len: u64,
}

/// Release store backed by a single newline-delimited JSON file.
///
/// # Examples
/// ```no_run
/// # async fn example() -> Result<(), backend::domain::ports::ReleaseRepositoryError> {
/// use backend::outbound::persistence::JsonLinesReleaseStore;
///
/// let store = JsonLinesReleaseStore::new("data/data.db");
/// store.load().await?;
/// # Ok(())
/// # }
/// ```
pub struct JsonLinesReleaseStore {
    path: PathBuf,
    records: RwLock<Option<HashMap<ReleaseId, Release>>>,
    appender: Mutex<Option<Appender>>,
}

impl JsonLinesReleaseStore {
    /// Unloaded handle; every operation fails until [`Self::load`] succeeds.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: RwLock::new(None),
            appender: Mutex::new(None),
        }
    }

    /// Store located at `<data_dir>/data.db`.
    pub fn in_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(STORE_FILE_NAME))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the data file into memory and open it for appending.
    ///
    /// A missing file is created. Calling this again after success does
    /// nothing.
    ///
    /// # Errors
    ///
    /// `Corrupt` when a complete line does not decode, `Io` when the file
    /// cannot be read or opened.
    pub async fn load(&self) -> Result<(), ReleaseRepositoryError> {
        let mut appender = self.appender.lock().await;
        if appender.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|err| io_error(parent, &err))?;
        }

        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(io_error(&self.path, &err)),
        };
        let parsed = parse_lines(&text)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|err| io_error(&self.path, &err))?;
        let mut len = parsed.valid_len;
        if parsed.valid_len < byte_len(&text) {
            warn!(
                path = %self.path.display(),
                kept_bytes = parsed.valid_len,
                "discarding torn final line in release store"
            );
            file.set_len(parsed.valid_len)
                .await
                .map_err(|err| io_error(&self.path, &err))?;
        } else if parsed.unterminated {
            Self::append(&mut file, b"\n")
                .await
                .map_err(|err| io_error(&self.path, &err))?;
            len = len.saturating_add(1);
        }

        info!(
            path = %self.path.display(),
            releases = parsed.records.len(),
            "release store loaded"
        );
        *self.records.write().await = Some(parsed.records);
        *appender = Some(Appender { file, len });
        Ok(())
    }

    async fn append(file: &mut File, line: &[u8]) -> io::Result<()> {
        file.write_all(line).await?;
        file.flush().await?;
        file.sync_data().await
    }
}

#[async_trait]
impl ReleaseRepository for JsonLinesReleaseStore {
    async fn insert(&self, release: &Release) -> Result<(), ReleaseRepositoryError> {
        let mut guard = self.appender.lock().await;
        let appender = guard
            .as_mut()
            .ok_or(ReleaseRepositoryError::NotInitialized)?;

        if self
            .records
            .read()
            .await
            .as_ref()
            .is_some_and(|records| records.contains_key(release.id()))
        {
            return Err(ReleaseRepositoryError::duplicate_id(release.id().as_str()));
        }

        let mut line = serde_json::to_vec(&ReleaseDocument::from(release))
            .map_err(|err| ReleaseRepositoryError::io(err.to_string()))?;
        line.push(b'\n');

        if let Err(err) = Self::append(&mut appender.file, &line).await {
            if let Err(rollback) = appender.file.set_len(appender.len).await {
                warn!(
                    path = %self.path.display(),
                    error = %rollback,
                    "failed to roll back partial append"
                );
            }
            return Err(io_error(&self.path, &err));
        }
        appender.len = appender.len.saturating_add(byte_len_of(&line));

        self.records
            .write()
            .await
            .as_mut()
            .ok_or(ReleaseRepositoryError::NotInitialized)?
            .insert(release.id().clone(), release.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ReleaseId) -> Result<Option<Release>, ReleaseRepositoryError> {
        let records = self.records.read().await;
        let loaded = records
            .as_ref()
            .ok_or(ReleaseRepositoryError::NotInitialized)?;
        Ok(loaded.get(id).cloned())
    }

    async fn find(
        &self,
        predicate: &ReleasePredicate,
        options: FindOptions,
    ) -> Result<Vec<Release>, ReleaseRepositoryError> {
        let mut matched: Vec<Release> = {
            let records = self.records.read().await;
            let loaded = records
                .as_ref()
                .ok_or(ReleaseRepositoryError::NotInitialized)?;
            loaded
                .values()
                .filter(|release| predicate.matches(release))
                .cloned()
                .collect()
        };

        match options.sort_by {
            SortKey::Date => matched.sort_by(|a, b| {
                a.date().cmp(&b.date()).then_with(|| a.id().cmp(b.id()))
            }),
        }
        if options.direction == SortDirection::Descending {
            matched.reverse();
        }
        if let Some(limit) = options.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }
}

struct ParsedLines {
    records: HashMap<ReleaseId, Release>,
    /// Bytes up to and including the last line worth keeping.
    valid_len: u64,
    /// The kept content does not end with a newline.
    unterminated: bool,
}

enum StoredLine {
    Record(Release),
    Deleted(ReleaseId),
    Bookkeeping,
}

/// Decode every line in order; later lines for the same id win.
///
/// A final line without a newline that fails to decode is treated as a torn
/// write and left out of `valid_len`.
fn parse_lines(text: &str) -> Result<ParsedLines, ReleaseRepositoryError> {
    let mut records = HashMap::new();
    let mut valid_len: u64 = 0;
    let mut unterminated = false;

    for (index, raw) in text.split_inclusive('\n').enumerate() {
        let complete = raw.ends_with('\n');
        let line = raw.trim();
        if !line.is_empty() {
            match decode_line(line) {
                Ok(StoredLine::Record(release)) => {
                    records.insert(release.id().clone(), release);
                }
                Ok(StoredLine::Deleted(id)) => {
                    records.remove(&id);
                }
                Ok(StoredLine::Bookkeeping) => {}
                Err(_) if !complete => break,
                Err(message) => {
                    let line_number = index.saturating_add(1);
                    return Err(ReleaseRepositoryError::corrupt(format!(
                        "line {line_number}: {message}"
                    )));
                }
            }
        }
        valid_len = valid_len.saturating_add(byte_len(raw));
        unterminated = !complete;
    }

    Ok(ParsedLines {
        records,
        valid_len,
        unterminated,
    })
}

/// Classify one non-blank line, including NeDB deletion and index entries.
fn decode_line(line: &str) -> Result<StoredLine, String> {
    let value: serde_json::Value = serde_json::from_str(line).map_err(|err| err.to_string())?;
    if value.get("$$indexCreated").is_some() || value.get("$$indexRemoved").is_some() {
        return Ok(StoredLine::Bookkeeping);
    }
    if value.get("$$deleted").and_then(serde_json::Value::as_bool) == Some(true) {
        let id = value
            .get("_id")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| "deletion entry without _id".to_owned())?;
        return ReleaseId::parse(id)
            .map(StoredLine::Deleted)
            .map_err(|err| err.to_string());
    }
    let document: ReleaseDocument = serde_json::from_value(value).map_err(|err| err.to_string())?;
    Release::try_from(document).map(StoredLine::Record)
}

fn byte_len(text: &str) -> u64 {
    byte_len_of(text.as_bytes())
}

fn byte_len_of(bytes: &[u8]) -> u64 {
    u64::try_from(bytes.len()).unwrap_or(u64::MAX)
}

fn io_error(path: &Path, err: &io::Error) -> ReleaseRepositoryError {
    ReleaseRepositoryError::io(format!("{}: {err}", path.display()))
}

#[cfg(test)]
#[path = "json_lines_release_store_tests.rs"]
mod tests;
