//! Shared validation helpers for inbound HTTP adapters.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;

use crate::domain::{Error, ReleaseValidationError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    DuplicateField,
    UnexpectedField,
    FieldTooLarge,
    InvalidText,
    MissingFilename,
    MalformedMultipart,
    InvalidTimestamp,
    InvalidChangelog,
    UnsupportedMediaType,
}

impl ErrorCode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::DuplicateField => "duplicate_field",
            Self::UnexpectedField => "unexpected_field",
            Self::FieldTooLarge => "field_too_large",
            Self::InvalidText => "invalid_text",
            Self::MissingFilename => "missing_filename",
            Self::MalformedMultipart => "malformed_multipart",
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::InvalidChangelog => "invalid_changelog",
            Self::UnsupportedMediaType => "unsupported_media_type",
        }
    }
}

/// Wire name of a request field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) const fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: ErrorCode, message: String) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

fn value_error(field: FieldName, code: ErrorCode, message: String, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(field, ErrorCode::MissingField, format!("missing required field: {name}"))
}

pub(crate) fn duplicate_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(field, ErrorCode::DuplicateField, format!("field {name} given more than once"))
}

pub(crate) fn unexpected_field_error(name: &str) -> Error {
    Error::invalid_request(format!("unexpected field: {name}")).with_details(json!({
        "field": name,
        "code": ErrorCode::UnexpectedField.as_str(),
    }))
}

pub(crate) fn field_too_large_error(field: &str, limit: usize) -> Error {
    Error::invalid_request(format!("field {field} exceeds {limit} bytes")).with_details(json!({
        "field": field,
        "code": ErrorCode::FieldTooLarge.as_str(),
    }))
}

pub(crate) fn invalid_text_error(field: &str) -> Error {
    Error::invalid_request(format!("field {field} must be UTF-8 text")).with_details(json!({
        "field": field,
        "code": ErrorCode::InvalidText.as_str(),
    }))
}

pub(crate) fn missing_filename_error(field: FieldName) -> Error {
    field_error(
        field,
        ErrorCode::MissingFilename,
        format!("{} part must carry a filename", field.as_str()),
    )
}

/// The multipart envelope itself could not be read.
pub(crate) fn malformed_multipart_error(reason: impl std::fmt::Display) -> Error {
    Error::invalid_request(format!("malformed multipart body: {reason}"))
        .with_details(json!({ "code": ErrorCode::MalformedMultipart.as_str() }))
}

pub(crate) fn unsupported_media_type_error(field: FieldName, value: &str) -> Error {
    value_error(
        field,
        ErrorCode::UnsupportedMediaType,
        "file must be application/zip or application/x-zip-compressed".to_owned(),
        value,
    )
}

/// Parse a closed-set value such as `type=nightly`.
pub(crate) fn parse_enum<T>(value: &str) -> Result<T, Error>
where
    T: FromStr<Err = ReleaseValidationError>,
{
    value.parse::<T>().map_err(Error::from)
}

pub(crate) fn parse_rfc3339_timestamp(field: FieldName, value: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| {
            value_error(
                field,
                ErrorCode::InvalidTimestamp,
                format!("{} must be an RFC 3339 timestamp", field.as_str()),
                value,
            )
        })
}

/// Listing bounds accept a full timestamp or a bare `YYYY-MM-DD` day, which
/// means midnight UTC.
pub(crate) fn parse_filter_date(field: FieldName, value: &str) -> Result<DateTime<Utc>, Error> {
    if let Some(midnight) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }
    parse_rfc3339_timestamp(field, value).map_err(|_| {
        value_error(
            field,
            ErrorCode::InvalidTimestamp,
            format!(
                "{} must be an RFC 3339 timestamp or a YYYY-MM-DD date",
                field.as_str()
            ),
            value,
        )
    })
}

/// `changelog` is sent as a JSON array of strings.
pub(crate) fn parse_changelog(field: FieldName, value: &str) -> Result<Vec<String>, Error> {
    serde_json::from_str::<Vec<String>>(value).map_err(|_| {
        value_error(
            field,
            ErrorCode::InvalidChangelog,
            format!("{} must be a JSON array of strings", field.as_str()),
            value,
        )
    })
}
