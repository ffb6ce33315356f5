//! Persistence adapters implementing the release store port.
//!
//! The store keeps its whole content in memory after an explicit startup
//! load and appends new records to a newline-delimited JSON file.

mod json_lines_release_store;
mod release_document;

pub use json_lines_release_store::{JsonLinesReleaseStore, STORE_FILE_NAME};
