//! API server — mounts the form-session REST surface and the metrics
//! exporter.

use axum::routing::{get, post, put};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use segment_composer::FormStore;
use segment_core::config::AppConfig;
use segment_delivery::DeliveryClient;

use crate::rest::{self, AppState};

/// Build the application router. Exposed separately from [`ApiServer`] so
/// tests can drive it without binding a socket.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Form sessions
        .route("/v1/forms", post(rest::create_form))
        .route("/v1/forms/:id", get(rest::get_form).delete(rest::delete_form))
        .route("/v1/forms/:id/open", post(rest::open_form))
        .route("/v1/forms/:id/cancel", post(rest::cancel_form))
        .route("/v1/forms/:id/name", put(rest::set_name))
        .route("/v1/forms/:id/schemas", post(rest::add_schema))
        .route(
            "/v1/forms/:id/schemas/:index",
            put(rest::change_schema).delete(rest::remove_schema),
        )
        .route("/v1/forms/:id/submit", post(rest::submit_form))
        // Catalog and operational endpoints
        .route("/v1/catalog", get(rest::catalog))
        .route("/v1/deliveries", get(rest::list_deliveries))
        .route("/health", get(rest::health_check))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP server for the segment form API.
pub struct ApiServer {
    config: AppConfig,
    store: Arc<FormStore>,
    delivery: DeliveryClient,
}

impl ApiServer {
    pub fn new(config: AppConfig, store: Arc<FormStore>, delivery: DeliveryClient) -> Self {
        Self {
            config,
            store,
            delivery,
        }
    }

    /// Start the HTTP server. Runs until the process exits.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let state = AppState {
            store: self.store.clone(),
            delivery: self.delivery.clone(),
            start_time: Instant::now(),
        };

        let app = router(state);

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the Prometheus metrics exporter on its own port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        Ok(())
    }
}
