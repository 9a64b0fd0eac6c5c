//! BrandForge — guided marketing-creative generation over a generative-AI
//! backend.
//!
//! Main entry point that wires configuration, the backend, the session
//! store, and the API server together.

use std::sync::Arc;

use clap::Parser;
use forge_api::{ApiServer, SessionStore};
use forge_core::config::AppConfig;
use forge_genai::Backend;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "brandforge")]
#[command(about = "Guided marketing-creative generation over a generative-AI backend")]
#[command(version)]
struct Cli {
    /// HTTP port (overrides config)
    #[arg(long, env = "BRAND_FORGE__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics port (overrides config)
    #[arg(long, env = "BRAND_FORGE__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Generative backend API key (overrides config; omit for mock mode)
    #[arg(long, env = "BRAND_FORGE__GENAI__API_KEY")]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brandforge=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("BrandForge starting up");

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
    if let Some(api_key) = cli.api_key {
        config.genai.api_key = Some(api_key);
    }

    info!(
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        mock_mode = config.genai.api_key.is_none(),
        "Configuration loaded"
    );

    // Resolve the generative backend once; it is injected into every
    // session's pipeline from here on.
    let backend = Backend::from_config(&config.genai)?;

    let store = Arc::new(SessionStore::new(backend, config.studio.clone()));

    let server = ApiServer::new(config, store);
    server.start_metrics().await?;
    server.start_http().await?;

    Ok(())
}
