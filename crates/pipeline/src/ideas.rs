//! Campaign ideation: one structured call turning a brand identity into a
//! small batch of campaign ideas.

use forge_core::config::StudioConfig;
use forge_core::types::{BrandIdentity, CampaignIdea};
use forge_core::{ForgeError, ForgeResult};
use forge_genai::{mock, Backend, GenerativeBackend, ResponseSchema};
use tracing::info;

pub struct CampaignIdeator {
    backend: Backend,
    config: StudioConfig,
}

impl CampaignIdeator {
    pub fn new(backend: Backend, config: StudioConfig) -> Self {
        Self { backend, config }
    }

    /// Generate a fresh idea batch for the brand. Each invocation fully
    /// replaces the previous batch; results are never merged.
    ///
    /// The schema enforces per-item shape only. The prompt asks for
    /// [`StudioConfig::idea_count`] ideas, but a response with a different
    /// count is accepted and passed through unmodified.
    pub async fn generate(&self, brand: &BrandIdentity) -> ForgeResult<Vec<CampaignIdea>> {
        match &self.backend {
            Backend::Mock => Ok(mock::campaign_ideas()),
            Backend::Live(client) => self
                .generate_live(client.as_ref(), brand)
                .await
                .map_err(|e| ForgeError::CampaignIdeation(e.detail())),
        }
    }

    async fn generate_live(
        &self,
        client: &dyn GenerativeBackend,
        brand: &BrandIdentity,
    ) -> ForgeResult<Vec<CampaignIdea>> {
        let schema = ResponseSchema::array(ResponseSchema::object(vec![
            ("headline", ResponseSchema::string()),
            ("description", ResponseSchema::string()),
        ]));

        let prompt = format!(
            "You are a marketing strategist for a company with the following brand identity:\n\
             - Name: {name}\n\
             - Tagline: {tagline}\n\
             - Tone/Voice: {tone}\n\n\
             Generate {count} distinct and creative marketing campaign ideas. For each \
             campaign, provide a catchy headline and a brief 1-2 sentence description \
             of the campaign's goal.",
            name = brand.name,
            tagline = brand.tagline,
            tone = brand.tone,
            count = self.config.idea_count,
        );

        let value = client.generate_structured(&prompt, &schema).await?;
        let ideas: Vec<CampaignIdea> = serde_json::from_value(value)?;

        info!(brand = %brand.name, count = ideas.len(), "campaign ideas generated");
        Ok(ideas)
    }
}
