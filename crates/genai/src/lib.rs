//! Generative backend clients: structured text generation and image
//! generation behind a single trait, with a deterministic mock mode when
//! no credential is configured.

pub mod gemini;
pub mod mock;
pub mod schema;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use forge_core::config::GenAiConfig;
use forge_core::ForgeResult;
use tracing::{info, warn};

pub use gemini::GeminiBackend;
pub use schema::ResponseSchema;
pub use types::{GeneratedImage, ImageFormat, ImageRequest};

/// A remote generative backend. Implementations translate our internal
/// request shapes to the platform-specific API.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Issue one structured-generation request: a natural-language prompt
    /// plus a required-output schema. The response must parse as JSON; the
    /// parsed value is returned without further shape validation.
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &ResponseSchema,
    ) -> ForgeResult<serde_json::Value>;

    /// Issue one image-generation request and return the (base64-encoded)
    /// payload with its MIME type.
    async fn generate_image(&self, request: &ImageRequest) -> ForgeResult<GeneratedImage>;
}

/// Backend handle injected into every generation component at
/// construction. The live-vs-mock decision is made exactly once, here,
/// and never re-derived from ambient state.
#[derive(Clone)]
pub enum Backend {
    Live(Arc<dyn GenerativeBackend>),
    Mock,
}

impl Backend {
    /// Resolve the backend from configuration. A missing or empty API key
    /// selects the deterministic mock mode; that is a documented degraded
    /// mode, not an error.
    pub fn from_config(config: &GenAiConfig) -> ForgeResult<Self> {
        match config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {
                let client = GeminiBackend::new(config)?;
                info!(
                    text_model = %config.text_model,
                    image_model = %config.image_model,
                    "generative backend configured"
                );
                Ok(Backend::Live(Arc::new(client)))
            }
            _ => {
                warn!("no API key configured, generation will use mock responses");
                Ok(Backend::Mock)
            }
        }
    }

    /// Wrap an existing client, e.g. a stub in tests.
    pub fn live(client: Arc<dyn GenerativeBackend>) -> Self {
        Backend::Live(client)
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, Backend::Mock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_resolution_from_config() {
        let no_key = GenAiConfig::default();
        assert!(Backend::from_config(&no_key).unwrap().is_mock());

        let blank_key = GenAiConfig {
            api_key: Some("   ".to_string()),
            ..GenAiConfig::default()
        };
        assert!(Backend::from_config(&blank_key).unwrap().is_mock());

        let with_key = GenAiConfig {
            api_key: Some("test-key".to_string()),
            ..GenAiConfig::default()
        };
        assert!(!Backend::from_config(&with_key).unwrap().is_mock());
    }
}
