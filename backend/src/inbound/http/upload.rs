//! Multipart decoding for release uploads.
//!
//! Text parts are collected first; the `file` part is then forwarded chunk by
//! chunk into the ingestion port while the port hashes and writes it. Nothing
//! after the `file` part is read.

use std::io;

use actix_multipart::{Field, Multipart};
use bytes::Bytes;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use tracing::debug;

use crate::domain::ports::IngestReleaseRequest;
use crate::domain::{
    Architecture, ArchitectureSet, Environment, Error, OperatingSystem, Release, ReleaseMetadata,
    ReleaseType,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, duplicate_field_error, field_too_large_error, invalid_text_error,
    malformed_multipart_error, missing_field_error, missing_filename_error, parse_changelog,
    parse_enum, parse_rfc3339_timestamp, unexpected_field_error, unsupported_media_type_error,
};

/// Upper bound for a single text part.
pub(crate) const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Chunks buffered between the multipart reader and the ingestion port.
const FORWARD_BUFFER_CHUNKS: usize = 8;

const OPERATING_SYSTEM: FieldName = FieldName::new("operatingSystem");
const ARCHITECTURE: FieldName = FieldName::new("architecture");
const TYPE: FieldName = FieldName::new("type");
const VERSION: FieldName = FieldName::new("version");
const NAME: FieldName = FieldName::new("name");
const CHANGELOG: FieldName = FieldName::new("changelog");
const COMMIT_SHA: FieldName = FieldName::new("commitSha");
const BUILD_DATE: FieldName = FieldName::new("buildDate");
const FILE: FieldName = FieldName::new("file");

const ZIP_MEDIA_TYPES: [&str; 2] = ["application/zip", "application/x-zip-compressed"];

#[derive(Debug, Default)]
struct UploadForm {
    operating_system: Option<OperatingSystem>,
    architecture: Option<Architecture>,
    release_type: Option<ReleaseType>,
    metadata: ReleaseMetadata,
}

/// Store `value` unless the field was already seen.
fn set_once<T>(
    slot: &mut Option<T>,
    field: FieldName,
    parse: impl FnOnce() -> Result<T, Error>,
) -> Result<(), Error> {
    if slot.is_some() {
        return Err(duplicate_field_error(field));
    }
    *slot = Some(parse()?);
    Ok(())
}

impl UploadForm {
    fn accept(&mut self, name: &str, text: &str, allowed: &ArchitectureSet) -> Result<(), Error> {
        match name {
            "operatingSystem" => {
                set_once(&mut self.operating_system, OPERATING_SYSTEM, || {
                    parse_enum(text)
                })
            }
            "architecture" => set_once(&mut self.architecture, ARCHITECTURE, || {
                allowed.parse_member(text).map_err(Error::from)
            }),
            "type" => set_once(&mut self.release_type, TYPE, || parse_enum(text)),
            "version" => set_once(&mut self.metadata.version, VERSION, || Ok(text.to_owned())),
            "name" => set_once(&mut self.metadata.name, NAME, || Ok(text.to_owned())),
            "changelog" => set_once(&mut self.metadata.changelog, CHANGELOG, || {
                parse_changelog(CHANGELOG, text)
            }),
            "commitSha" => set_once(&mut self.metadata.commit_sha, COMMIT_SHA, || {
                Ok(text.to_owned())
            }),
            "buildDate" => set_once(&mut self.metadata.build_date, BUILD_DATE, || {
                parse_rfc3339_timestamp(BUILD_DATE, text)
            }),
            other => Err(unexpected_field_error(other)),
        }
    }

    fn finish(self) -> Result<(Environment, ReleaseType, ReleaseMetadata), Error> {
        let operating_system = self
            .operating_system
            .ok_or_else(|| missing_field_error(OPERATING_SYSTEM))?;
        let architecture = self
            .architecture
            .ok_or_else(|| missing_field_error(ARCHITECTURE))?;
        let release_type = self.release_type.ok_or_else(|| missing_field_error(TYPE))?;
        Ok((
            Environment {
                operating_system,
                architecture,
            },
            release_type,
            self.metadata,
        ))
    }
}

/// Decode a release upload and hand it to the ingestion port.
pub(crate) async fn ingest_upload(state: &HttpState, mut payload: Multipart) -> Result<Release, Error> {
    let mut form = UploadForm::default();
    while let Some(next) = payload.next().await {
        let mut field = next.map_err(malformed_multipart_error)?;
        let name = field.name().unwrap_or_default().to_owned();
        if name == FILE.as_str() {
            let file_name = file_name_of(&field)?;
            check_media_type(&field)?;
            let (environment, release_type, metadata) = form.finish()?;
            let (sender, receiver) = mpsc::channel(FORWARD_BUFFER_CHUNKS);
            let request = IngestReleaseRequest {
                environment,
                release_type,
                metadata,
                file_name,
                declared_size: None,
                body: receiver.boxed(),
            };
            let (_, outcome) = futures::join!(
                forward_file(field, sender),
                state.releases.ingest(request)
            );
            return outcome;
        }
        // Empty text parts are what browsers send for blank inputs.
        let text = read_text(&mut field, &name).await?;
        if !text.is_empty() {
            form.accept(&name, &text, &state.architectures)?;
        }
    }
    Err(missing_field_error(FILE))
}

fn file_name_of(field: &Field) -> Result<String, Error> {
    field
        .content_disposition()
        .and_then(|disposition| disposition.get_filename())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| missing_filename_error(FILE))
}

fn check_media_type(field: &Field) -> Result<(), Error> {
    let essence = field
        .content_type()
        .map(|mime| mime.essence_str().to_owned())
        .unwrap_or_default();
    if ZIP_MEDIA_TYPES.contains(&essence.as_str()) {
        Ok(())
    } else {
        Err(unsupported_media_type_error(FILE, &essence))
    }
}

async fn read_text(field: &mut Field, name: &str) -> Result<String, Error> {
    let mut buffer = Vec::new();
    while let Some(next) = field.next().await {
        let chunk = next.map_err(malformed_multipart_error)?;
        if buffer.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(field_too_large_error(name, MAX_TEXT_FIELD_BYTES));
        }
        buffer.extend_from_slice(&chunk);
    }
    String::from_utf8(buffer).map_err(|_| invalid_text_error(name))
}

/// Relay file chunks until the part ends, the client fails, or ingestion stops
/// listening.
async fn forward_file(mut field: Field, mut sender: mpsc::Sender<io::Result<Bytes>>) {
    while let Some(next) = field.next().await {
        let item = next.map_err(|err| io::Error::other(err.to_string()));
        let failed = item.is_err();
        if sender.send(item).await.is_err() {
            debug!("ingestion stopped reading the upload early");
            break;
        }
        if failed {
            break;
        }
    }
}
