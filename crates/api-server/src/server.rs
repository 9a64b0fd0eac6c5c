//! API server — HTTP router, middleware, and the metrics exporter.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, patch, post, put};
use axum::Router;
use forge_core::config::AppConfig;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::rest::{self, AppState};
use crate::sessions::SessionStore;

/// Main API server for the wizard pipeline.
pub struct ApiServer {
    config: AppConfig,
    store: Arc<SessionStore>,
}

impl ApiServer {
    pub fn new(config: AppConfig, store: Arc<SessionStore>) -> Self {
        Self { config, store }
    }

    /// Start the HTTP server. Blocks until shutdown.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let state = AppState {
            store: self.store.clone(),
            start_time: Instant::now(),
        };

        let app = Router::new()
            // Session lifecycle
            .route("/v1/sessions", post(rest::create_session))
            .route(
                "/v1/sessions/:id",
                get(rest::get_session).delete(rest::delete_session),
            )
            // Wizard operations
            .route("/v1/sessions/:id/scan", post(rest::scan_website))
            .route("/v1/sessions/:id/ideas", post(rest::generate_ideas))
            .route("/v1/sessions/:id/select", post(rest::select_campaign))
            .route("/v1/sessions/:id/creatives", post(rest::add_creative))
            .route("/v1/sessions/:id/creatives/size", put(rest::change_size))
            .route("/v1/sessions/:id/restart", post(rest::restart))
            // Creative view state and export
            .route(
                "/v1/sessions/:id/creatives/:creative_id/display",
                patch(rest::patch_display),
            )
            .route(
                "/v1/sessions/:id/creatives/:creative_id/download",
                get(rest::download_creative),
            )
            // Operational endpoints
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            // Middleware
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the Prometheus metrics exporter on its dedicated port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        // Keep the recorder handle alive for the process lifetime.
        std::mem::forget(handle);
        Ok(())
    }
}
