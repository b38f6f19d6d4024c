//! ImgScout-RS: an image search and blob-storage tool service
//!
//! This is the main entry point for the application. It serves the tool
//! protocol over stdin/stdout: one JSON request per line in, one JSON result
//! per line out.

use anyhow::Result;
use imgscout_rs::{
    config::Settings,
    network::HttpClient,
    search::ImageSearch,
    service::{ImageService, ToolRequest},
    storage::FsBlobStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout carries protocol traffic, so logs go to stderr
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting ImgScout-RS v{}", imgscout_rs::VERSION);

    // Load configuration
    let settings = load_settings()?;
    info!(
        "Loaded configuration for instance: {}",
        settings.general.instance_name
    );

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;
    info!("HTTP client initialized");

    // Capability check happens once, inside the orchestrator constructor
    let search = ImageSearch::new(client.clone(), &settings);

    // Blob store gateway
    let store = Arc::new(FsBlobStore::new(&settings.storage)?);
    info!("Blob store ready at {}", settings.storage.root);

    let service = ImageService::new(&settings, client, search, store);

    serve_stdio(service).await
}

/// Read one JSON tool request per line, write one JSON result per line.
async fn serve_stdio(service: ImageService) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    info!("Serving tool requests on stdin");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<ToolRequest>(&line) {
            Ok(request) => {
                let response = service.dispatch(request).await;
                serde_json::to_string(&response)?
            }
            Err(err) => {
                warn!(error = %err, "rejected malformed request");
                serde_json::json!({
                    "status": "failed",
                    "error": format!("invalid request: {err}"),
                })
                .to_string()
            }
        };

        stdout.write_all(reply.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("Input closed, shutting down");
    Ok(())
}

/// Load settings from file or use defaults
fn load_settings() -> Result<Settings> {
    // Check environment variable first
    if let Ok(path) = std::env::var("IMGSCOUT_SETTINGS_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(&path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    // Check for settings file in the usual locations
    let paths = [
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
        PathBuf::from("/etc/imgscout/settings.yml"),
        dirs::config_dir()
            .map(|p| p.join("imgscout-rs/settings.yml"))
            .unwrap_or_default(),
    ];

    for path in paths.iter() {
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    // Use defaults
    info!("No settings file found, using defaults");
    let mut settings = Settings::default();
    settings.merge_env();
    Ok(settings)
}
