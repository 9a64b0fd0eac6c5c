//! Creative rendering: one image call per creative, parameterized by the
//! campaign, the brand identity, and a size preset.

use chrono::Utc;
use forge_core::types::{BrandIdentity, CampaignIdea, Creative, SizePreset};
use forge_core::{ForgeError, ForgeResult};
use forge_genai::{mock, Backend, GenerativeBackend, ImageFormat, ImageRequest};
use uuid::Uuid;

/// Renders a single on-brand creative per invocation. Batch semantics
/// (replace vs. append) are owned by the caller.
#[derive(Clone)]
pub struct CreativeRenderer {
    backend: Backend,
}

impl CreativeRenderer {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Render exactly one creative for the campaign at the requested size.
    pub async fn render(
        &self,
        campaign: &CampaignIdea,
        brand: &BrandIdentity,
        size: SizePreset,
    ) -> ForgeResult<Creative> {
        match &self.backend {
            Backend::Mock => Ok(Creative {
                id: Uuid::new_v4(),
                image_url: mock::placeholder_image(),
                headline: campaign.headline.clone(),
                size_preset: size,
                created_at: Utc::now(),
            }),
            Backend::Live(client) => self
                .render_live(client.as_ref(), campaign, brand, size)
                .await
                .map_err(|e| ForgeError::CreativeRender(e.detail())),
        }
    }

    async fn render_live(
        &self,
        client: &dyn GenerativeBackend,
        campaign: &CampaignIdea,
        brand: &BrandIdentity,
        size: SizePreset,
    ) -> ForgeResult<Creative> {
        let palette = brand.colors.join(", ");
        let prompt = format!(
            "Create a stunning, high-quality promotional image for a marketing campaign.\n\n\
             Campaign Headline: \"{headline}\"\n\
             Brand Name: {name}\n\
             Brand Tone: {tone}\n\n\
             Visual Style:\n\
             - The image should be visually appealing, professional, and align with a \
             \"{tone}\" aesthetic.\n\
             - Dominant colors should be inspired by this palette: {palette}.\n\
             - Photography should be clean, modern, and high-resolution.\n\n\
             Image Content:\n\
             - Based on the headline \"{headline}\", create a compelling scene.\n\
             - Do NOT include any text or logos in the image itself. The image should \
             be a clean background visual.",
            headline = campaign.headline,
            name = brand.name,
            tone = brand.tone,
        );

        let request = ImageRequest::single(prompt, size.aspect_ratio(), ImageFormat::Jpeg);
        let image = client.generate_image(&request).await?;

        Ok(Creative {
            id: Uuid::new_v4(),
            image_url: image.into_image_ref(),
            headline: campaign.headline.clone(),
            size_preset: size,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubBackend;
    use forge_genai::mock;

    fn brand() -> BrandIdentity {
        mock::brand_identity("https://wanderlust-coffee.com")
    }

    fn campaign() -> CampaignIdea {
        CampaignIdea {
            headline: "Escape the 9-to-5".to_string(),
            description: "Remote work, real coffee.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_render_preserves_headline_and_size() {
        let renderer = CreativeRenderer::new(Backend::Mock);
        let creative = renderer
            .render(&campaign(), &brand(), SizePreset::Story)
            .await
            .unwrap();

        assert_eq!(creative.headline, "Escape the 9-to-5");
        assert_eq!(creative.size_preset, SizePreset::Story);
        assert!(creative.image_url.as_str().starts_with("https://picsum.photos/seed/"));
    }

    #[tokio::test]
    async fn test_mock_renders_are_visually_distinct() {
        let renderer = CreativeRenderer::new(Backend::Mock);
        let first = renderer
            .render(&campaign(), &brand(), SizePreset::Square)
            .await
            .unwrap();
        let second = renderer
            .render(&campaign(), &brand(), SizePreset::Square)
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_ne!(first.image_url, second.image_url);
    }

    #[tokio::test]
    async fn test_live_render_requests_the_mapped_aspect_ratio() {
        for (size, expected) in [
            (SizePreset::Square, "1:1"),
            (SizePreset::Story, "9:16"),
            (SizePreset::Banner, "16:9"),
        ] {
            let stub = StubBackend::scripted(vec![]);
            let renderer = CreativeRenderer::new(Backend::live(stub.clone()));

            let creative = renderer.render(&campaign(), &brand(), size).await.unwrap();
            assert!(creative.image_url.is_embedded());
            assert_eq!(creative.size_preset, size);

            let requests = stub.image_requests();
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].aspect_ratio, expected);
            assert_eq!(requests[0].output_format.mime_type(), "image/jpeg");
        }
    }

    #[tokio::test]
    async fn test_live_prompt_embeds_brand_and_campaign() {
        let stub = StubBackend::scripted(vec![]);
        let renderer = CreativeRenderer::new(Backend::live(stub.clone()));
        renderer
            .render(&campaign(), &brand(), SizePreset::Square)
            .await
            .unwrap();

        let prompt = &stub.image_requests()[0].prompt;
        assert!(prompt.contains("Escape the 9-to-5"));
        assert!(prompt.contains("Wanderlust Coffee Co."));
        assert!(prompt.contains("Adventurous, warm, and artisanal"));
        assert!(prompt.contains("#362222, #F5F1ED, #A38560, #EFEFEF"));
        assert!(prompt.contains("Do NOT include any text or logos"));
    }

    #[tokio::test]
    async fn test_render_failure_surfaces_as_stage_error() {
        let stub = StubBackend::with_failures(vec![], [0]);
        let renderer = CreativeRenderer::new(Backend::live(stub));

        let err = renderer
            .render(&campaign(), &brand(), SizePreset::Square)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), "creative");
    }
}
