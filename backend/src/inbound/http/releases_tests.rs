//! Tests for release HTTP handlers.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use futures::StreamExt;
use rstest::rstest;
use serde_json::Value;

use super::*;
use crate::domain::ports::{
    FixtureReleaseCommand, FixtureReleaseQuery, IfNoneMatch, MockReleaseCommand,
    MockReleaseQuery, ReleaseCommand, ReleaseQuery,
};
use crate::domain::{
    Architecture, ArchitectureSet, ContentDigest, Environment, OperatingSystem, ReleaseDraft,
    ReleaseFile, ReleaseId, ReleaseType,
};

const BOUNDARY: &str = "release-test-boundary";
const PAYLOAD: &[u8] = b"PK\x03\x04 release artifact bytes";
const RELEASE_ID: &str = "00112233445566778899aabbccddeeff";

fn test_app(
    releases: Arc<dyn ReleaseCommand>,
    releases_query: Arc<dyn ReleaseQuery>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let state = HttpState::new(releases, releases_query, ArchitectureSet::default());
    App::new().app_data(web::Data::new(state)).service(
        web::scope("/api")
            .service(create_release)
            .service(list_releases)
            .service(get_release)
            .service(download_release),
    )
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File { content_type: &'a str, bytes: &'a [u8] },
}

fn multipart(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
            Part::File {
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"app.zip\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(parts: &[Part<'_>]) -> actix_test::TestRequest {
    actix_test::TestRequest::post()
        .uri("/api/releases")
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(multipart(parts))
}

fn zip_part() -> Part<'static> {
    Part::File {
        content_type: "application/zip",
        bytes: PAYLOAD,
    }
}

fn sample_release() -> Release {
    Release::from(ReleaseDraft {
        id: ReleaseId::parse(RELEASE_ID).expect("valid id"),
        date: Utc
            .with_ymd_and_hms(2024, 3, 9, 23, 59, 58)
            .single()
            .expect("valid date"),
        environment: Environment {
            operating_system: OperatingSystem::Linux,
            architecture: Architecture::X86,
        },
        release_type: ReleaseType::Nightly,
        file: ReleaseFile {
            name: "app.zip".to_owned(),
            size: u64::try_from(PAYLOAD.len()).expect("payload fits in u64"),
        },
        sha1: ContentDigest::of(PAYLOAD),
        metadata: None,
    })
}

fn header_value<'a>(response: &'a actix_web::dev::ServiceResponse, name: header::HeaderName) -> Option<&'a str> {
    response.headers().get(name).and_then(|value| value.to_str().ok())
}

fn rejecting_command() -> Arc<dyn ReleaseCommand> {
    let mut command = MockReleaseCommand::new();
    command.expect_ingest().never();
    Arc::new(command)
}

#[actix_web::test]
async fn upload_streams_file_into_ingestion() {
    let app = actix_test::init_service(test_app(
        Arc::new(FixtureReleaseCommand),
        Arc::new(FixtureReleaseQuery),
    ))
    .await;
    let request = upload_request(&[
        Part::Text("operatingSystem", "linux"),
        Part::Text("architecture", "arm64"),
        Part::Text("type", "feature"),
        Part::Text("version", "2.0.1"),
        Part::Text("changelog", r#"["faster start-up"]"#),
        zip_part(),
    ])
    .to_request();

    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = header_value(&response, header::LOCATION)
        .expect("location header")
        .to_owned();
    let body: Value = actix_test::read_body_json(response).await;

    assert_eq!(location, format!("/api/releases/{}", body["id"].as_str().expect("id")));
    assert_eq!(body["environment"]["operatingSystem"], "linux");
    assert_eq!(body["environment"]["architecture"], "arm64");
    assert_eq!(body["type"], "feature");
    assert_eq!(body["file"]["name"], "app.zip");
    assert_eq!(body["file"]["size"], PAYLOAD.len());
    assert_eq!(body["sha1"], ContentDigest::of(PAYLOAD).as_str());
    assert_eq!(body["metadata"]["version"], "2.0.1");
    assert_eq!(body["metadata"]["changelog"][0], "faster start-up");
}

#[rstest]
#[case::missing_os(
    vec![Part::Text("architecture", "x86"), Part::Text("type", "nightly"), zip_part()],
    "operatingSystem",
    "missing_field"
)]
#[case::missing_file(
    vec![Part::Text("operatingSystem", "linux"), Part::Text("architecture", "x86"), Part::Text("type", "nightly")],
    "file",
    "missing_field"
)]
#[case::disallowed_arch(
    vec![Part::Text("operatingSystem", "linux"), Part::Text("architecture", "arm"), Part::Text("type", "nightly"), zip_part()],
    "architecture",
    "unsupported_value"
)]
#[case::bad_media_type(
    vec![
        Part::Text("operatingSystem", "linux"),
        Part::Text("architecture", "x86"),
        Part::Text("type", "nightly"),
        Part::File { content_type: "text/plain", bytes: PAYLOAD },
    ],
    "file",
    "unsupported_media_type"
)]
#[case::bad_build_date(
    vec![Part::Text("buildDate", "last tuesday"), zip_part()],
    "buildDate",
    "invalid_timestamp"
)]
#[actix_web::test]
async fn invalid_uploads_never_reach_ingestion(
    #[case] parts: Vec<Part<'static>>,
    #[case] field: &str,
    #[case] code: &str,
) {
    let app = actix_test::init_service(test_app(rejecting_command(), Arc::new(FixtureReleaseQuery)))
        .await;
    let response = actix_test::call_service(&app, upload_request(&parts).to_request()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], field);
    assert_eq!(body["details"]["code"], code);
}

#[actix_web::test]
async fn non_multipart_upload_is_rejected() {
    let app = actix_test::init_service(test_app(rejecting_command(), Arc::new(FixtureReleaseQuery)))
        .await;
    let request = actix_test::TestRequest::post()
        .uri("/api/releases")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{}")
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn listing_compiles_query_into_filter() {
    let mut query = MockReleaseQuery::new();
    query
        .expect_list_releases()
        .withf(|filter| {
            *filter
                == ReleaseFilter {
                    operating_system: Some(OperatingSystem::Linux),
                    release_type: Some(ReleaseType::Nightly),
                    date_after: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).single(),
                    ..ReleaseFilter::default()
                }
        })
        .times(1)
        .returning(|_| Ok(vec![sample_release()]));
    let app = actix_test::init_service(test_app(rejecting_command(), Arc::new(query))).await;

    let request = actix_test::TestRequest::get()
        .uri("/api/releases?operatingSystem=linux&type=nightly&dateAfter=2024-03-01")
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, request).await;
    assert_eq!(body[0]["id"], RELEASE_ID);
    assert_eq!(body[0]["date"], "2024-03-09T23:59:58Z");
}

#[rstest]
#[case("/api/releases?type=weekly", "type")]
#[case("/api/releases?architecture=sparc", "architecture")]
#[case("/api/releases?dateBefore=soon", "dateBefore")]
#[actix_web::test]
async fn listing_rejects_unknown_criteria(#[case] uri: &str, #[case] field: &str) {
    let mut query = MockReleaseQuery::new();
    query.expect_list_releases().never();
    let app = actix_test::init_service(test_app(rejecting_command(), Arc::new(query))).await;
    let response =
        actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["details"]["field"], field);
}

#[actix_web::test]
async fn unknown_release_is_not_found() {
    let app = actix_test::init_service(test_app(
        rejecting_command(),
        Arc::new(FixtureReleaseQuery),
    ))
    .await;
    let request = actix_test::TestRequest::get()
        .uri(&format!("/api/releases/{RELEASE_ID}"))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn download_streams_artifact_with_validators() {
    let mut query = MockReleaseQuery::new();
    query
        .expect_download_release()
        .withf(|request| request.id == RELEASE_ID && request.if_none_match == IfNoneMatch::Absent)
        .times(1)
        .returning(|_| {
            Ok(DownloadOutcome::Content(ReleaseContent {
                release: sample_release(),
                body: futures::stream::iter(vec![Ok(Bytes::from_static(PAYLOAD))]).boxed(),
            }))
        });
    let app = actix_test::init_service(test_app(rejecting_command(), Arc::new(query))).await;

    let request = actix_test::TestRequest::get()
        .uri(&format!("/api/releases/{RELEASE_ID}/files"))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let etag = format!("\"{}\"", ContentDigest::of(PAYLOAD));
    assert_eq!(header_value(&response, header::ETAG), Some(etag.as_str()));
    assert_eq!(header_value(&response, header::CACHE_CONTROL), Some("no-cache"));
    assert_eq!(
        header_value(&response, header::CONTENT_TYPE),
        Some("application/octet-stream")
    );
    assert_eq!(
        header_value(&response, header::CONTENT_DISPOSITION),
        Some("attachment; filename=\"app.zip\"")
    );
    let length = PAYLOAD.len().to_string();
    assert_eq!(
        header_value(&response, header::CONTENT_LENGTH),
        Some(length.as_str())
    );
    assert_eq!(actix_test::read_body(response).await, PAYLOAD);
}

#[actix_web::test]
async fn matching_validator_yields_not_modified() {
    let digest = ContentDigest::of(PAYLOAD);
    let expected = IfNoneMatch::Digests(vec![digest.as_str().to_owned()]);
    let mut query = MockReleaseQuery::new();
    query
        .expect_download_release()
        .withf(move |request| request.if_none_match == expected)
        .times(1)
        .returning(|_| {
            Ok(DownloadOutcome::NotModified {
                digest: ContentDigest::of(PAYLOAD),
            })
        });
    let app = actix_test::init_service(test_app(rejecting_command(), Arc::new(query))).await;

    let etag = format!("W/\"{digest}\"");
    let request = actix_test::TestRequest::get()
        .uri(&format!("/api/releases/{RELEASE_ID}/files"))
        .insert_header((header::IF_NONE_MATCH, etag))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    let quoted = format!("\"{digest}\"");
    assert_eq!(header_value(&response, header::ETAG), Some(quoted.as_str()));
    assert!(actix_test::read_body(response).await.is_empty());
}
