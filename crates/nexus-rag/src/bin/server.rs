//! Assistant backend binary
//!
//! Run with: cargo run -p nexus-rag --bin nexus-rag-server [config.toml]

use nexus_rag::{config::NexusConfig, server::NexusServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nexus_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Config file path: first CLI argument, then NEXUS_CONFIG, then defaults
    let config = match std::env::args()
        .nth(1)
        .or_else(|| std::env::var("NEXUS_CONFIG").ok())
    {
        Some(path) => {
            tracing::info!("loading configuration from {}", path);
            NexusConfig::load(&path)?
        }
        None => {
            tracing::info!("no config file given, using defaults");
            NexusConfig::default()
        }
    };

    tracing::info!("configuration loaded");
    tracing::info!("  - data dir: {}", config.storage.data_dir.display());
    tracing::info!("  - gateway: {} ({})", config.gateway.base_url, config.gateway.model);
    tracing::info!(
        "  - chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    if config.auth.tokens.is_empty() {
        tracing::warn!("no auth tokens configured; every request will be rejected");
    }

    let server = NexusServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST   /api/documents     - Upload a document");
    println!("  GET    /api/documents     - List documents");
    println!("  DELETE /api/documents/:id - Delete a document");
    println!("  POST   /api/process       - (Re)process a document");
    println!("  POST   /api/chat          - Chat with grounded streaming answers");
    println!("  GET    /api/jobs          - Ingestion queue stats");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
