//! Cache-control policies for HTTP handlers.

/// Caches may store the response but must revalidate it with the origin
/// before every reuse.
pub const NO_CACHE: &str = "no-cache";

/// Probe responses must never be served from a cache.
pub const NO_STORE: &str = "no-store";

/// Header tuple forcing revalidation of artifact downloads.
#[must_use]
pub const fn revalidate_header() -> (&'static str, &'static str) {
    ("Cache-Control", NO_CACHE)
}
