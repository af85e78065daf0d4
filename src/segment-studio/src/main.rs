//! Segment Studio — audience segment composer with webhook delivery.
//!
//! Main entry point that wires the form store, the delivery client, and the
//! REST surface together and starts the server.

use clap::Parser;
use segment_api::ApiServer;
use segment_composer::FormStore;
use segment_core::config::AppConfig;
use segment_core::notice::LogSink;
use segment_core::segment::Catalog;
use segment_delivery::DeliveryClient;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "segment-studio")]
#[command(about = "Audience segment composer with webhook delivery")]
#[command(version)]
struct Cli {
    /// HTTP port (overrides config)
    #[arg(long, env = "SEGMENT_STUDIO__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics port (overrides config)
    #[arg(long, env = "SEGMENT_STUDIO__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Collector endpoint URL (overrides config)
    #[arg(long, env = "SEGMENT_STUDIO__DELIVERY__ENDPOINT_URL")]
    endpoint_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "segment_studio=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Segment Studio starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }
    if let Some(url) = cli.endpoint_url {
        config.delivery.endpoint_url = url;
    }

    info!(
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        endpoint = %config.delivery.endpoint_url,
        "Configuration loaded"
    );

    // Form sessions over the standard trait catalog
    let store = Arc::new(FormStore::new(Catalog::standard()));

    // Delivery client; notices surface through the logs
    let delivery = DeliveryClient::new(&config.delivery.endpoint_url, Arc::new(LogSink))?;

    let api_server = ApiServer::new(config, store, delivery);

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    // Serve until the process is stopped
    api_server.start_http().await
}
