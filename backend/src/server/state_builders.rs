//! Builds the HTTP port bundle from server configuration.

use std::sync::Arc;

use backend::domain::{ReleaseIngestionService, ReleaseQueryService};
use backend::inbound::http::state::HttpState;

use super::ServerConfig;

/// Wire the release services over the configured store.
pub(super) fn build_http_state(config: &ServerConfig) -> HttpState {
    let releases = ReleaseIngestionService::new(
        config.store.clone(),
        config.layout.clone(),
        config.architectures.clone(),
        Arc::new(mockable::DefaultClock),
    )
    .with_buffer_chunks(config.upload_buffer_chunks);
    let releases_query = ReleaseQueryService::new(config.store.clone(), config.layout.clone());
    HttpState::new(
        Arc::new(releases),
        Arc::new(releases_query),
        config.architectures.clone(),
    )
}
