mod config;
mod errors;
mod llm_client;
mod log_store;
mod models;
mod progress;
mod routes;
mod state;
mod workout;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LogStoreBackend};
use crate::llm_client::{GeminiClient, ModelFallback};
use crate::log_store::auth::{ServiceAccountKey, TokenProvider};
use crate::log_store::{LogStore, MemoryStore, SheetsStore};
use crate::progress::cache::TableCache;
use crate::progress::reporter::ProgressReporter;
use crate::routes::build_router;
use crate::state::AppState;
use crate::workout::parser::WorkoutParser;
use crate::workout::recorder::SessionRecorder;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting gymlog v{}", env!("CARGO_PKG_VERSION"));

    // One HTTP client for every outbound call; no timeout beyond reqwest's defaults.
    let http = reqwest::Client::builder()
        .user_agent(concat!("gymlog/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    // Extraction Service
    let gemini = Arc::new(GeminiClient::new(http.clone(), config.gemini_api_key.clone()));
    let fallback = ModelFallback::new(gemini, config.extraction_models.clone());
    info!("Extraction models: {}", fallback.models().join(", "));

    // Log Store
    let store = build_log_store(&config, http)?;

    let cache = Arc::new(TableCache::new(config.report_cache_ttl));
    let state = AppState {
        parser: WorkoutParser::new(fallback),
        recorder: SessionRecorder::new(store.clone(), cache.clone()),
        reporter: ProgressReporter::new(store, cache),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs the configured Log Store. Credentials stop here; the store
/// only ever sees an authorised token provider.
fn build_log_store(config: &Config, http: reqwest::Client) -> Result<Arc<dyn LogStore>> {
    match config.log_store {
        LogStoreBackend::Memory => {
            info!("Log store: in-memory (rows are lost on restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
        LogStoreBackend::Sheets => {
            let key_json = config
                .service_account_json
                .as_deref()
                .context("Service account key is required for the sheets log store")?;
            let key = ServiceAccountKey::from_json(key_json)?;
            let token = TokenProvider::new(http.clone(), key)?;
            info!(
                "Log store: Google Sheets {:?}, worksheet '{}', as {}",
                config.spreadsheet,
                config.worksheet,
                token.client_email()
            );
            Ok(Arc::new(SheetsStore::new(
                http,
                token,
                config.spreadsheet.clone(),
                config.worksheet.clone(),
            )))
        }
    }
}
