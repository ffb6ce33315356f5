//! Backend entry-point: loads settings and the release store, then serves
//! the REST API.

mod server;

use std::sync::Arc;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::health::HealthState;
use backend::outbound::persistence::JsonLinesReleaseStore;
use backend::settings::ReleaseServerSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ReleaseServerSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let architectures = settings.architectures().map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("RELEASES_ARCHITECTURES: {e}"))
    })?;
    let bind_addr = settings.bind_addr()?;
    let data_dir = settings.data_dir();

    let store = Arc::new(JsonLinesReleaseStore::in_data_dir(&data_dir));
    store.load().await.map_err(|e| {
        std::io::Error::other(format!(
            "failed to load release store {}: {e}",
            store.path().display()
        ))
    })?;
    info!(
        data_dir = %data_dir.display(),
        architectures = %architectures,
        "release store loaded"
    );

    let config = ServerConfig::new(bind_addr, data_dir, store)
        .with_architectures(architectures)
        .with_upload_buffer_chunks(settings.upload_buffer_chunks());

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    info!(%bind_addr, "listening");
    let outcome = server.await;
    health_state.mark_unhealthy();
    outcome
}
