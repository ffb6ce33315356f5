//! Entity tag handling for artifact downloads.
//!
//! The stored SHA-1 digest is the validator. Responses carry it quoted in
//! `ETag`; `If-None-Match` values are unquoted before reaching the domain.

use actix_web::http::header::{HeaderMap, IF_NONE_MATCH};

use crate::domain::ContentDigest;
use crate::domain::ports::IfNoneMatch;

/// Quoted strong entity tag for a digest.
pub(crate) fn entity_tag(digest: &ContentDigest) -> String {
    format!("\"{digest}\"")
}

/// Collect validators from every `If-None-Match` header line.
///
/// Accepts quoted, weak (`W/"..."`) and bare tags, comma separated lists and
/// the `*` wildcard. Weak tags compare by value.
pub(crate) fn parse_if_none_match(headers: &HeaderMap) -> IfNoneMatch {
    let mut tags = Vec::new();
    for value in headers.get_all(IF_NONE_MATCH) {
        let Ok(text) = value.to_str() else {
            continue;
        };
        for candidate in text.split(',').map(str::trim) {
            if candidate == "*" {
                return IfNoneMatch::Any;
            }
            let unprefixed = candidate.strip_prefix("W/").unwrap_or(candidate);
            let bare = unprefixed.trim_matches('"');
            if !bare.is_empty() {
                tags.push(bare.to_owned());
            }
        }
    }
    if tags.is_empty() {
        IfNoneMatch::Absent
    } else {
        IfNoneMatch::Digests(tags)
    }
}
