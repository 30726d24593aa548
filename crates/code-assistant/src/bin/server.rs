//! Code assistant server binary
//!
//! Run with: cargo run -p code-assistant --bin code-assistant-server [config.toml]

use code_assistant::{config::AppConfig, server::AppServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "code_assistant=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Database: {}", config.storage.database_path.display());
    tracing::info!("  - Uploads: {} (max {}MB)", config.storage.upload_dir.display(), config.storage.max_upload_size_mb);
    tracing::info!("  - Ollama: {} ({})", config.llm.base_url, config.llm.generate_model);
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    tracing::info!("  - Chunk size: {} (overlap {})", config.retrieval.chunk_size, config.retrieval.chunk_overlap);

    let server = AppServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/auth/register       - Create an account");
    println!("  POST /api/auth/login          - Obtain a bearer token");
    println!("  POST /api/documents/upload    - Upload a document");
    println!("  POST /api/chat/query          - Ask a question");
    println!("  GET  /api/admin/stats         - Dashboard statistics");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
