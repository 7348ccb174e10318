//! PCD Eventos backend relay
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - POST /upload         multipart document relay            │
//! │  - POST /backup-json    JSON snapshot relay                 │
//! │  - GET  /listar-backups most recent backup lookup           │
//! │  - GET  /               liveness                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Storage Layer                             │
//! │  - S3-compatible provider (Cloudflare R2)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every durable operation is delegated to the external provider; the
//! relay itself keeps no state between requests.
//!
//! # Modules
//!
//! - `api`: HTTP handlers for uploads, backups and metrics
//! - `storage`: S3-compatible provider client
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;

use std::sync::Arc;

/// Request body limit, matching the original client contract (50 MiB)
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Application state shared across all handlers
///
/// This struct is cloned for each request. Handlers share only the
/// immutable configuration and the provider client; there is no mutable
/// state and therefore no locking.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Object storage client (S3-compatible provider)
    pub storage: Arc<storage::ObjectStorage>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Errors
    /// Returns error if the storage client cannot be initialized
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let storage = storage::ObjectStorage::new(&config.storage, &config.provider).await?;
        tracing::info!("Object storage initialized");

        Ok(Self {
            config: Arc::new(config),
            storage: Arc::new(storage),
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::extract::DefaultBodyLimit;
    use axum::{Router, routing::get, routing::post};
    use tower_http::{
        compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
        trace::TraceLayer,
    };

    Router::new()
        .route("/", get(liveness))
        .route("/upload", post(api::upload_files))
        .route("/backup-json", post(api::backup_json))
        .route("/listar-backups", get(api::latest_backup))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(api::metrics_router())
}

async fn liveness() -> &'static str {
    "✅ Servidor PCD Eventos rodando e conectado ao provedor de armazenamento."
}
