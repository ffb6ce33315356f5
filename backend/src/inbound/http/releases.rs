//! Release HTTP handlers.
//!
//! ```text
//! POST /api/releases            (multipart/form-data)
//! GET  /api/releases?operatingSystem=linux&dateAfter=2024-03-01
//! GET  /api/releases/{id}
//! GET  /api/releases/{id}/files
//! ```

use actix_multipart::Multipart;
use actix_web::http::header::{
    self, ContentDisposition, DispositionParam, DispositionType,
};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::filter::ReleaseFilter;
use crate::domain::ports::{DownloadOutcome, DownloadReleaseRequest, ReleaseContent};
use crate::domain::{Error, Release};
use crate::inbound::http::ApiResult;
use crate::inbound::http::cache_control::revalidate_header;
use crate::inbound::http::conditional::{entity_tag, parse_if_none_match};
use crate::inbound::http::schemas::{ErrorSchema, ReleaseSchema, ReleaseUploadSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::upload::ingest_upload;
use crate::inbound::http::validation::{FieldName, parse_enum, parse_filter_date};

/// Listing criteria accepted on `GET /api/releases`.
///
/// Date bounds are inclusive and accept an RFC 3339 timestamp or a
/// `YYYY-MM-DD` day (midnight UTC).
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListReleasesQuery {
    /// `windows`, `linux` or `osx`.
    pub operating_system: Option<String>,
    /// `x86`, `arm` or `arm64`.
    pub architecture: Option<String>,
    /// `nightly`, `feature` or `release`.
    #[serde(rename = "type")]
    pub release_type: Option<String>,
    pub date_after: Option<String>,
    pub date_before: Option<String>,
}

impl TryFrom<ListReleasesQuery> for ReleaseFilter {
    type Error = Error;

    fn try_from(query: ListReleasesQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            operating_system: query.operating_system.as_deref().map(parse_enum).transpose()?,
            architecture: query.architecture.as_deref().map(parse_enum).transpose()?,
            release_type: query.release_type.as_deref().map(parse_enum).transpose()?,
            date_after: query
                .date_after
                .as_deref()
                .map(|value| parse_filter_date(FieldName::new("dateAfter"), value))
                .transpose()?,
            date_before: query
                .date_before
                .as_deref()
                .map(|value| parse_filter_date(FieldName::new("dateBefore"), value))
                .transpose()?,
        })
    }
}

/// Upload a release artifact with its environment and metadata.
///
/// Text parts must precede the `file` part; the artifact is hashed and
/// written as it arrives and the record is created only once it is on disk.
#[utoipa::path(
    post,
    path = "/api/releases",
    request_body(content = ReleaseUploadSchema, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Release stored", body = ReleaseSchema,
            headers(("Location" = String, description = "Release resource"))),
        (status = 400, description = "Invalid upload", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema),
        (status = 503, description = "Release store not loaded", body = ErrorSchema)
    ),
    tags = ["releases"],
    operation_id = "createRelease"
)]
#[post("/releases")]
pub async fn create_release(
    state: web::Data<HttpState>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let release = ingest_upload(&state, payload).await?;
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/api/releases/{}", release.id())))
        .json(release))
}

/// List releases, oldest first, capped at 1000 entries.
#[utoipa::path(
    get,
    path = "/api/releases",
    params(ListReleasesQuery),
    responses(
        (status = 200, description = "Matching releases", body = [ReleaseSchema]),
        (status = 400, description = "Invalid filter", body = ErrorSchema),
        (status = 503, description = "Release store not loaded", body = ErrorSchema)
    ),
    tags = ["releases"],
    operation_id = "listReleases"
)]
#[get("/releases")]
pub async fn list_releases(
    state: web::Data<HttpState>,
    query: web::Query<ListReleasesQuery>,
) -> ApiResult<web::Json<Vec<Release>>> {
    let filter = ReleaseFilter::try_from(query.into_inner())?;
    let releases = state.releases_query.list_releases(filter).await?;
    Ok(web::Json(releases))
}

#[utoipa::path(
    get,
    path = "/api/releases/{id}",
    params(("id" = String, Path, description = "32 character hexadecimal release id")),
    responses(
        (status = 200, description = "Release record", body = ReleaseSchema),
        (status = 404, description = "Unknown or malformed id", body = ErrorSchema)
    ),
    tags = ["releases"],
    operation_id = "getRelease"
)]
#[get("/releases/{id}")]
pub async fn get_release(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Release>> {
    let release = state.releases_query.get_release(&path.into_inner()).await?;
    Ok(web::Json(release))
}

/// Stream the release artifact.
///
/// The SHA-1 digest is the entity tag; a matching `If-None-Match` yields
/// `304` without opening the file.
#[utoipa::path(
    get,
    path = "/api/releases/{id}/files",
    params(
        ("id" = String, Path, description = "32 character hexadecimal release id"),
        ("If-None-Match" = Option<String>, Header, description = "Previously received ETag")
    ),
    responses(
        (status = 200, description = "Artifact bytes", content_type = "application/octet-stream",
            headers(
                ("ETag" = String, description = "Quoted SHA-1 of the artifact"),
                ("Content-Disposition" = String, description = "Attachment with the uploaded file name")
            )),
        (status = 304, description = "Client copy is current"),
        (status = 404, description = "Unknown or malformed id", body = ErrorSchema),
        (status = 500, description = "Artifact unreadable", body = ErrorSchema)
    ),
    tags = ["releases"],
    operation_id = "downloadRelease"
)]
#[get("/releases/{id}/files")]
pub async fn download_release(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let download = DownloadReleaseRequest {
        id: path.into_inner(),
        if_none_match: parse_if_none_match(request.headers()),
    };
    match state.releases_query.download_release(download).await? {
        DownloadOutcome::NotModified { digest } => Ok(HttpResponse::NotModified()
            .insert_header((header::ETAG, entity_tag(&digest)))
            .insert_header(revalidate_header())
            .finish()),
        DownloadOutcome::Content(content) => Ok(stream_content(content)),
    }
}

fn stream_content(content: ReleaseContent) -> HttpResponse {
    let ReleaseContent { release, body } = content;
    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(release.file().name.clone())],
    };
    HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header(disposition)
        .insert_header((header::ETAG, entity_tag(release.sha1())))
        .insert_header(revalidate_header())
        .no_chunking(release.file().size)
        .streaming(body)
}

#[cfg(test)]
#[path = "releases_tests.rs"]
mod tests;
