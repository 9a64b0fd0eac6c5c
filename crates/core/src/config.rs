use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `BRAND_FORGE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub genai: GenAiConfig,
    #[serde(default)]
    pub studio: StudioConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Generative backend configuration. An absent or empty `api_key` is not
/// an error: it selects the deterministic mock mode.
#[derive(Debug, Clone, Deserialize)]
pub struct GenAiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Pipeline tuning: batch sizes requested from the backend and the
/// simulated scan latency on the mock path.
#[derive(Debug, Clone, Deserialize)]
pub struct StudioConfig {
    #[serde(default = "default_idea_count")]
    pub idea_count: usize,
    #[serde(default = "default_sample_image_count")]
    pub sample_image_count: usize,
    #[serde(default = "default_initial_creative_count")]
    pub initial_creative_count: usize,
    #[serde(default = "default_mock_scan_delay_ms")]
    pub mock_scan_delay_ms: u64,
}

// Default functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_image_model() -> String {
    "imagen-4.0-generate-001".to_string()
}
fn default_request_timeout_secs() -> u64 {
    60
}
fn default_idea_count() -> usize {
    3
}
fn default_sample_image_count() -> usize {
    5
}
fn default_initial_creative_count() -> usize {
    3
}
fn default_mock_scan_delay_ms() -> u64 {
    1500
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            idea_count: default_idea_count(),
            sample_image_count: default_sample_image_count(),
            initial_creative_count: default_initial_creative_count(),
            mock_scan_delay_ms: default_mock_scan_delay_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            genai: GenAiConfig::default(),
            studio: StudioConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("BRAND_FORGE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
