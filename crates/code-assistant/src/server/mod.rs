//! HTTP server for the code assistant

pub mod routes;
pub mod state;

use axum::{extract::State, http::HeaderValue, routing::get, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::generation::OllamaClient;
use crate::processing;
use crate::providers::{
    GenerationService, LocalRetrieval, OcrEngine, OllamaEmbedder, OllamaGenerator,
    RetrievalService, TesseractOcr,
};
use crate::storage::Database;
use state::AppState;

/// Code assistant HTTP server
pub struct AppServer {
    config: AppConfig,
    state: AppState,
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

impl AppServer {
    /// Wire storage and collaborators, probe them and start the ingestion worker.
    ///
    /// An unreachable Ollama or a retrieval index that fails to open is logged
    /// and the server starts degraded.
    pub async fn new(config: AppConfig) -> Result<Self> {
        tracing::info!("Initializing code assistant...");

        std::fs::create_dir_all(&config.storage.upload_dir)?;
        ensure_parent(&config.storage.database_path)?;
        ensure_parent(&config.retrieval.index_path)?;

        let db = Database::new(&config.storage.database_path)?;
        tracing::info!("Database ready at {}", config.storage.database_path.display());

        let client = Arc::new(OllamaClient::new(&config.llm)?);
        let embedder = Arc::new(OllamaEmbedder::from_client(client.clone()));
        let generation: Arc<dyn GenerationService> = Arc::new(OllamaGenerator::from_client(client));
        let retrieval: Arc<dyn RetrievalService> =
            Arc::new(LocalRetrieval::new(config.retrieval.clone(), embedder));
        let ocr: Arc<dyn OcrEngine> =
            Arc::new(TesseractOcr::new(config.processing.ocr_language.clone()));

        if !TesseractOcr::is_available() {
            tracing::warn!("tesseract not found, image uploads will fail to process");
        }

        if !generation.check_connection().await {
            tracing::warn!("Starting without a reachable Ollama at {}", config.llm.base_url);
        }
        if let Err(e) = retrieval.initialize().await {
            tracing::warn!("Retrieval unavailable, answering without documents: {}", e);
        }

        let job_queue = processing::start(&config.processing, db.clone(), retrieval.clone(), ocr);
        let state = AppState::new(config.clone(), db, retrieval, generation, job_queue);

        tracing::info!("Ready");
        Ok(Self { config, state })
    }

    /// Wrap already assembled state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Serve until Ctrl+C
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.router();

        tracing::info!("Starting code assistant on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind {}: {}", addr, e)))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        tracing::info!("Server stopped");
        Ok(())
    }

    pub fn address(&self) -> String {
        self.config.address()
    }
}

/// Build the full router over the given state
pub fn build_router(state: AppState) -> Router {
    let config = state.config();

    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload = usize::try_from(config.storage.max_upload_bytes()).unwrap_or(usize::MAX);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api", routes::api_routes(max_upload))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// GET /
async fn root() -> Json<Value> {
    Json(json!({
        "message": "Enterprise Code Assistant API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "ollama": state.generation().is_connected(),
        "rag": state.retrieval().is_ready()
    }))
}
