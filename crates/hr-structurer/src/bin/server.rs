//! HR structurer server binary
//!
//! Run with: cargo run -p hr-structurer --bin hr-structurer-server [config.toml]

use std::path::PathBuf;

use hr_structurer::{config::StructurerConfig, logging::init_tracing, server::StructurerServer};

/// Environment variable naming the configuration file
const CONFIG_ENV_VAR: &str = "HR_STRUCTURER_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV_VAR).ok())
        .map(PathBuf::from);

    let config = StructurerConfig::load(config_path.as_deref())?;
    init_tracing(&config.logging)?;

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                      HR Structurer                        ║
║        Norwegian HR documents to structured JSON          ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    match &config_path {
        Some(path) => tracing::info!("Configuration loaded from {}", path.display()),
        None => tracing::info!("Using default configuration"),
    }
    tracing::info!("  - Backend: {:?}", config.llm.backend);
    tracing::info!("  - Model: {}", config.llm.model);
    tracing::info!("  - Max file size: {} bytes", config.processing.max_file_size);
    tracing::info!("  - Summary length: {} words", config.processing.summary_words);

    let server = StructurerServer::new(config).await?;

    let llm = server.state().llm();
    match llm.health_check().await {
        Ok(true) => tracing::info!("Inference provider {} is reachable", llm.name()),
        Ok(false) => tracing::warn!("Inference provider {} reported unhealthy", llm.name()),
        Err(e) => tracing::warn!("Inference provider {} not available: {}", llm.name(), e),
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/batches              - Upload documents for structuring");
    println!("  GET  /api/batches/:id          - Batch progress");
    println!("  GET  /api/batches/:id/archive  - Download records as ZIP");
    println!("  POST /api/structure            - Structure one document");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
