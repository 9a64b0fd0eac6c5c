use thiserror::Error;

pub type ForgeResult<T> = Result<T, ForgeError>;

/// Stage-scoped error taxonomy. Generation failures are converted into the
/// variant for the stage that produced them at the stage boundary and never
/// propagate further; retries are always user-initiated re-invocations.
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Brand profile generation failed: {0}")]
    BrandProfile(String),

    #[error("Campaign ideation failed: {0}")]
    CampaignIdeation(String),

    #[error("Creative rendering failed: {0}")]
    CreativeRender(String),

    #[error("Backend request failed: {0}")]
    Backend(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ForgeError {
    /// Human-readable name of the pipeline stage an error belongs to,
    /// used in user-facing failure messages.
    pub fn stage(&self) -> &'static str {
        match self {
            ForgeError::BrandProfile(_) => "brand profile",
            ForgeError::CampaignIdeation(_) => "campaign ideas",
            ForgeError::CreativeRender(_) => "creative",
            ForgeError::Backend(_) => "backend",
            ForgeError::Validation(_) => "validation",
            ForgeError::Config(_) => "configuration",
            ForgeError::Serialization(_) => "serialization",
        }
    }

    /// Bare failure message, without the variant prefix. Used when
    /// re-scoping a plumbing error to the stage that owns it.
    pub fn detail(self) -> String {
        match self {
            ForgeError::BrandProfile(msg)
            | ForgeError::CampaignIdeation(msg)
            | ForgeError::CreativeRender(msg)
            | ForgeError::Backend(msg)
            | ForgeError::Validation(msg)
            | ForgeError::Config(msg) => msg,
            ForgeError::Serialization(e) => e.to_string(),
        }
    }
}
