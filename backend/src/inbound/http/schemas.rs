//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.
//!
//! The schema wrappers mirror the structure of their corresponding domain
//! types but live in the inbound adapter layer where framework concerns belong.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// The release or its artifact does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The release store is not loaded yet.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// Disk or store I/O failed.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    #[schema(example = "architecture must be one of: x86, arm64")]
    message: String,
    /// Correlation identifier, also sent as the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Structured validation details: `field`, `code`, `value`, `allowed`.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::OperatingSystem`].
#[derive(ToSchema)]
#[schema(as = crate::domain::OperatingSystem, rename_all = "lowercase")]
pub enum OperatingSystemSchema {
    Windows,
    Linux,
    Osx,
}

/// OpenAPI schema for [`crate::domain::Architecture`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Architecture, rename_all = "lowercase")]
pub enum ArchitectureSchema {
    X86,
    Arm,
    Arm64,
}

/// OpenAPI schema for [`crate::domain::ReleaseType`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ReleaseType, rename_all = "lowercase")]
pub enum ReleaseTypeSchema {
    Nightly,
    Feature,
    Release,
}

/// OpenAPI schema for [`crate::domain::Environment`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Environment, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct EnvironmentSchema {
    operating_system: OperatingSystemSchema,
    architecture: ArchitectureSchema,
}

/// OpenAPI schema for [`crate::domain::ReleaseFile`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ReleaseFile)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ReleaseFileSchema {
    /// File name supplied at upload.
    #[schema(example = "app.zip")]
    name: String,
    /// Size in bytes.
    #[schema(example = 1024)]
    size: u64,
}

/// OpenAPI schema for [`crate::domain::ReleaseMetadata`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ReleaseMetadata, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ReleaseMetadataSchema {
    version: Option<String>,
    name: Option<String>,
    changelog: Option<Vec<String>>,
    commit_sha: Option<String>,
    #[schema(format = DateTime)]
    build_date: Option<String>,
}

/// OpenAPI schema for [`crate::domain::Release`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Release, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ReleaseSchema {
    #[schema(example = "00112233445566778899aabbccddeeff", pattern = "^[0-9a-f]{32}$")]
    id: String,
    /// Creation instant, UTC.
    #[schema(format = DateTime, example = "2024-03-09T23:59:58Z")]
    date: String,
    environment: EnvironmentSchema,
    #[schema(rename = "type")]
    release_type: ReleaseTypeSchema,
    file: ReleaseFileSchema,
    /// Hex SHA-1 of the artifact; also its entity tag.
    #[schema(pattern = "^[0-9a-f]{40}$")]
    sha1: String,
    metadata: Option<ReleaseMetadataSchema>,
}

/// Multipart form accepted by `POST /api/releases`.
///
/// Text parts must precede `file`.
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ReleaseUploadSchema {
    operating_system: OperatingSystemSchema,
    architecture: ArchitectureSchema,
    #[schema(rename = "type")]
    release_type: ReleaseTypeSchema,
    version: Option<String>,
    name: Option<String>,
    /// JSON array of strings.
    #[schema(example = r#"["fix crash on start-up"]"#)]
    changelog: Option<String>,
    commit_sha: Option<String>,
    #[schema(format = DateTime)]
    build_date: Option<String>,
    /// `application/zip` or `application/x-zip-compressed`.
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}
