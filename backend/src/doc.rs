//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects the release and health handlers plus the schema
//! wrappers from [`crate::inbound::http::schemas`], keeping utoipa out of
//! the domain types. Swagger UI serves it in debug builds.

use utoipa::OpenApi;

use crate::inbound::http::schemas::{
    ArchitectureSchema, EnvironmentSchema, ErrorCodeSchema, ErrorSchema, OperatingSystemSchema,
    ReleaseFileSchema, ReleaseMetadataSchema, ReleaseSchema, ReleaseTypeSchema,
    ReleaseUploadSchema,
};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Release repository API",
        description = "Upload build artifacts, list releases and download them with conditional requests."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::releases::create_release,
        crate::inbound::http::releases::list_releases,
        crate::inbound::http::releases::get_release,
        crate::inbound::http::releases::download_release,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        ReleaseSchema,
        EnvironmentSchema,
        OperatingSystemSchema,
        ArchitectureSchema,
        ReleaseTypeSchema,
        ReleaseFileSchema,
        ReleaseMetadataSchema,
        ReleaseUploadSchema,
    )),
    tags(
        (name = "releases", description = "Release upload, listing and download"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
