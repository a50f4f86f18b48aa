mod applications;
mod config;
mod errors;
mod extract;
mod models;
mod routes;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::models::job::JobCatalog;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::files::FileStore;
use crate::storage::metadata::JsonStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting intake API v{}", env!("CARGO_PKG_VERSION"));

    // Content directory for uploads
    let files = FileStore::new(&config.upload_dir);
    files
        .ensure_root()
        .await
        .with_context(|| format!("creating upload dir {}", config.upload_dir.display()))?;
    info!("Upload directory: {}", files.root().display());

    // Metadata store (reloads the persisted application list)
    let store = JsonStore::open(config.metadata_dir())
        .await
        .context("opening metadata store")?;

    let jobs = JobCatalog::builtin();
    info!("Job catalog loaded ({} postings)", jobs.all().len());

    let cors = build_cors(&config)?;

    // Build app state
    let state = AppState {
        config: config.clone(),
        jobs: Arc::new(jobs),
        files,
        store: Arc::new(store),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// CORS for the configured front-end origin.
fn build_cors(config: &Config) -> Result<CorsLayer> {
    let origin: HeaderValue = config
        .cors_origin
        .parse()
        .with_context(|| format!("CORS_ORIGIN '{}' is not a valid origin", config.cors_origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}
