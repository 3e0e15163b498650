//! fiscal-ingest-server - fiscal-document upload service
//!
//! Serves the routes of [`fiscal_ingest::http`] over an in-memory document store.
//! Configuration comes from `FISCAL_INGEST_BIND` and `FISCAL_INGEST_MAX_UPLOAD_MB`; log
//! filtering from `RUST_LOG`.

use std::sync::Arc;

use fiscal_ingest::http::{AppState, ServerConfig, build_router};
use fiscal_ingest::ingestion::TracingObserver;
use fiscal_ingest::store::InMemoryDocumentStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    info!("Starting fiscal-ingest-server {}", env!("CARGO_PKG_VERSION"));
    info!("Max upload size: {} MB", config.max_upload_mb);

    let mut options = config.ingestion_options();
    options.observer = Some(Arc::new(TracingObserver));

    let state = AppState::new(Arc::new(InMemoryDocumentStore::new()), options);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("Listening on http://{}", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
