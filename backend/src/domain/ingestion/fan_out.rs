//! Single-pass upload persistence.
//!
//! The incoming stream is read once. Every chunk is handed to a SHA-1 task and
//! a file writer task through two bounded channels, so the slower consumer
//! throttles the reader and neither side buffers without limit. Bytes land in
//! `<id>.zip.partial` and only become `<id>.zip` after `fsync`.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use sha1::{Digest, Sha1};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::domain::ports::ByteStream;
use crate::domain::{ContentDigest, RepositoryLayout};

/// Digest and length of an artifact that is now durable on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PersistedUpload {
    pub(crate) digest: ContentDigest,
    pub(crate) size: u64,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum UploadError {
    #[error("upload stream failed: {0}")]
    Source(#[source] io::Error),
    #[error("writing {} failed: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("uploaded file is empty")]
    Empty,
    #[error("upload truncated: declared {declared} bytes, received {received}")]
    SizeMismatch { declared: u64, received: u64 },
    #[error("upload pipeline stopped before the stream ended")]
    Interrupted,
}

/// Removes the partial file unless disarmed. Covers early returns and a
/// dropped ingestion future alike.
struct PartialFile {
    path: PathBuf,
    armed: bool,
}

impl PartialFile {
    const fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(
                path = %self.path.display(),
                error = %err,
                "failed to remove partial upload"
            ),
        }
    }
}

/// Stream `source` to `target`, hashing it on the way.
///
/// `target`'s parent directory must already exist. On any failure nothing is
/// left at `target` or at its partial sibling.
pub(crate) async fn persist_upload(
    source: ByteStream,
    target: &Path,
    declared_size: Option<u64>,
    capacity: usize,
) -> Result<PersistedUpload, UploadError> {
    let partial = RepositoryLayout::partial_path(target);
    let mut guard = PartialFile::new(partial.clone());
    let write_error = |source| UploadError::Write {
        path: partial.clone(),
        source,
    };

    let mut file = File::create(&partial).await.map_err(write_error)?;

    let (hash_tx, hash_rx) = mpsc::channel::<Bytes>(capacity);
    let (write_tx, write_rx) = mpsc::channel::<Bytes>(capacity);

    let (received, digest, ()) = futures::try_join!(
        distribute(source, hash_tx, write_tx),
        hash_chunks(hash_rx),
        write_chunks(write_rx, &mut file, &partial),
    )?;

    if received == 0 {
        return Err(UploadError::Empty);
    }
    if let Some(declared) = declared_size.filter(|declared| *declared != received) {
        return Err(UploadError::SizeMismatch { declared, received });
    }

    file.sync_all().await.map_err(write_error)?;
    drop(file);
    fs::rename(&partial, target)
        .await
        .map_err(|source| UploadError::Write {
            path: target.to_path_buf(),
            source,
        })?;
    guard.disarm();

    Ok(PersistedUpload {
        digest,
        size: received,
    })
}

/// Read each chunk once and hand it to both consumers.
async fn distribute(
    mut source: ByteStream,
    mut hash_tx: mpsc::Sender<Bytes>,
    mut write_tx: mpsc::Sender<Bytes>,
) -> Result<u64, UploadError> {
    let mut received: u64 = 0;
    while let Some(next) = source.next().await {
        let chunk = next.map_err(UploadError::Source)?;
        if chunk.is_empty() {
            continue;
        }
        let len = u64::try_from(chunk.len()).map_err(|_| UploadError::Interrupted)?;
        received = received.saturating_add(len);
        hash_tx
            .send(chunk.clone())
            .await
            .map_err(|_| UploadError::Interrupted)?;
        write_tx
            .send(chunk)
            .await
            .map_err(|_| UploadError::Interrupted)?;
    }
    Ok(received)
}

async fn hash_chunks(mut chunks: mpsc::Receiver<Bytes>) -> Result<ContentDigest, UploadError> {
    let mut hasher = Sha1::new();
    while let Some(chunk) = chunks.next().await {
        hasher.update(&chunk);
    }
    Ok(ContentDigest::from_hasher(hasher))
}

async fn write_chunks(
    mut chunks: mpsc::Receiver<Bytes>,
    file: &mut File,
    path: &Path,
) -> Result<(), UploadError> {
    while let Some(chunk) = chunks.next().await {
        file.write_all(&chunk)
            .await
            .map_err(|source| UploadError::Write {
                path: path.to_path_buf(),
                source,
            })?;
    }
    file.flush().await.map_err(|source| UploadError::Write {
        path: path.to_path_buf(),
        source,
    })
}
