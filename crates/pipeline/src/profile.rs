//! Brand profile generation: one structured call drafts the identity, then
//! a logo render and a parallel sample-image fan-out complete it.

use std::sync::Arc;
use std::time::Duration;

use forge_core::config::StudioConfig;
use forge_core::types::{BrandIdentity, ImageRef};
use forge_core::{ForgeError, ForgeResult};
use forge_genai::{mock, Backend, GenerativeBackend, ImageFormat, ImageRequest, ResponseSchema};
use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::info;

/// Fixed style directive appended to every logo render.
const LOGO_STYLE: &str = "modern, vector, flat icon, centered on a clean background";

/// Derives a full [`BrandIdentity`] from a website URL.
pub struct BrandProfileGenerator {
    backend: Backend,
    config: StudioConfig,
}

/// The structured draft returned by the backend before any imagery exists.
#[derive(Debug, Deserialize)]
struct BrandProfileDraft {
    name: String,
    tagline: String,
    tone: String,
    colors: Vec<String>,
    #[serde(rename = "logoDescription")]
    logo_description: String,
    #[serde(rename = "imageDescriptions")]
    image_descriptions: Vec<String>,
}

impl BrandProfileGenerator {
    pub fn new(backend: Backend, config: StudioConfig) -> Self {
        Self { backend, config }
    }

    /// Derive a brand identity for the given URL.
    ///
    /// The URL is treated as an opaque string; the caller rejects empty
    /// input. Each invocation re-executes fully; nothing is cached. Any
    /// failure surfaces as [`ForgeError::BrandProfile`] and never yields a
    /// partially populated record.
    pub async fn generate(&self, website_url: &str) -> ForgeResult<BrandIdentity> {
        match &self.backend {
            Backend::Mock => {
                info!(url = website_url, "simulating website scan in mock mode");
                tokio::time::sleep(Duration::from_millis(self.config.mock_scan_delay_ms)).await;
                Ok(mock::brand_identity(website_url))
            }
            Backend::Live(client) => self
                .generate_live(client, website_url)
                .await
                .map_err(|e| ForgeError::BrandProfile(e.detail())),
        }
    }

    async fn generate_live(
        &self,
        client: &Arc<dyn GenerativeBackend>,
        website_url: &str,
    ) -> ForgeResult<BrandIdentity> {
        let draft = self.draft_profile(client.as_ref(), website_url).await?;

        // The schema enforces field presence but not content; the identity
        // record is all-or-nothing, so reject drafts that would leave it
        // partially populated.
        if draft.name.trim().is_empty()
            || draft.tagline.trim().is_empty()
            || draft.tone.trim().is_empty()
        {
            return Err(ForgeError::Backend(
                "draft profile has empty name, tagline, or tone".into(),
            ));
        }
        if draft.colors.len() != 4 {
            return Err(ForgeError::Backend(format!(
                "expected a palette of 4 colors, got {}",
                draft.colors.len()
            )));
        }

        let logo_image = self.render_logo(client.as_ref(), &draft).await?;
        let sample_images = self.render_samples(client, &draft).await?;

        info!(
            name = %draft.name,
            samples = sample_images.len(),
            "brand identity assembled"
        );

        Ok(BrandIdentity {
            name: draft.name,
            website_url: website_url.to_string(),
            tagline: draft.tagline,
            tone: draft.tone,
            colors: draft.colors,
            logo_image,
            sample_images,
        })
    }

    async fn draft_profile(
        &self,
        client: &dyn GenerativeBackend,
        website_url: &str,
    ) -> ForgeResult<BrandProfileDraft> {
        let schema = ResponseSchema::object(vec![
            ("name", ResponseSchema::string()),
            ("tagline", ResponseSchema::string()),
            ("tone", ResponseSchema::string()),
            ("colors", ResponseSchema::array(ResponseSchema::string())),
            ("logoDescription", ResponseSchema::string()),
            ("imageDescriptions", ResponseSchema::array(ResponseSchema::string())),
        ]);

        let prompt = format!(
            "You are a brand strategist. A company runs the website at {url}. \
             From the URL alone, infer a plausible brand identity for it.\n\
             Provide:\n\
             - name: the business name\n\
             - tagline: a short, memorable tagline\n\
             - tone: the brand voice in a few adjectives\n\
             - colors: exactly 4 hex color codes forming the brand palette\n\
             - logoDescription: a one-sentence concept for the company logo\n\
             - imageDescriptions: exactly {count} one-sentence descriptions of \
             lifestyle or product scenes that fit the brand",
            url = website_url,
            count = self.config.sample_image_count,
        );

        let value = client.generate_structured(&prompt, &schema).await?;
        let draft: BrandProfileDraft = serde_json::from_value(value)?;
        Ok(draft)
    }

    async fn render_logo(
        &self,
        client: &dyn GenerativeBackend,
        draft: &BrandProfileDraft,
    ) -> ForgeResult<ImageRef> {
        let prompt = format!("{}. Style: {}.", draft.logo_description, LOGO_STYLE);
        let request = ImageRequest::single(prompt, "1:1", ImageFormat::Png);
        let image = client.generate_image(&request).await?;
        Ok(image.into_image_ref())
    }

    /// Render every sample image concurrently. The join is all-or-nothing:
    /// the first failure aborts every sibling and fails the generation;
    /// results are reassembled in issue order.
    async fn render_samples(
        &self,
        client: &Arc<dyn GenerativeBackend>,
        draft: &BrandProfileDraft,
    ) -> ForgeResult<Vec<ImageRef>> {
        let palette = draft.colors.join(", ");

        let mut tasks = JoinSet::new();
        for (index, description) in draft.image_descriptions.iter().enumerate() {
            let client = Arc::clone(client);
            let prompt = format!(
                "{description}. The scene should feel {tone} and draw its dominant \
                 colors from this palette: {palette}. Clean, modern, high-resolution \
                 photography. Do not include any text or logos in the image.",
                tone = draft.tone,
            );
            let request = ImageRequest::single(prompt, "1:1", ImageFormat::Jpeg);
            tasks.spawn(async move { (index, client.generate_image(&request).await) });
        }

        let mut samples: Vec<Option<ImageRef>> = vec![None; draft.image_descriptions.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined
                .map_err(|e| ForgeError::Backend(format!("sample image task failed: {e}")))?;
            match result {
                Ok(image) => samples[index] = Some(image.into_image_ref()),
                Err(e) => {
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        samples
            .into_iter()
            .map(|slot| {
                slot.ok_or_else(|| ForgeError::Backend("sample image fan-out lost a result".into()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubBackend;
    use serde_json::json;

    fn studio_config() -> StudioConfig {
        StudioConfig {
            mock_scan_delay_ms: 0,
            ..StudioConfig::default()
        }
    }

    fn sample_draft() -> serde_json::Value {
        json!({
            "name": "Tidewater Surf Supply",
            "tagline": "Ride what the ocean gives you.",
            "tone": "Laid-back, salty, and genuine",
            "colors": ["#013A63", "#61A5C2", "#E8F1F2", "#FCA311"],
            "logoDescription": "A minimalist wave curling over a surfboard fin",
            "imageDescriptions": [
                "A longboarder walking a foggy beach at dawn",
                "Close-up of wax being applied to a board",
                "A camper van with boards on the roof",
                "Surfers waiting on the lineup at golden hour",
                "A workshop bench covered in shaping tools"
            ]
        })
    }

    #[tokio::test]
    async fn test_mock_scan_returns_the_fixed_record() {
        let generator = BrandProfileGenerator::new(Backend::Mock, studio_config());
        let brand = generator
            .generate("https://wanderlust-coffee.com")
            .await
            .unwrap();

        assert_eq!(brand.name, "Wanderlust Coffee Co.");
        assert_eq!(brand.tagline, "Your adventure in a cup.");
        assert_eq!(brand.tone, "Adventurous, warm, and artisanal");
        assert_eq!(brand.colors, ["#362222", "#F5F1ED", "#A38560", "#EFEFEF"]);
        assert_eq!(brand.website_url, "https://wanderlust-coffee.com");
        assert_eq!(brand.sample_images.len(), 4);
    }

    #[tokio::test]
    async fn test_mock_scan_is_idempotent() {
        let generator = BrandProfileGenerator::new(Backend::Mock, studio_config());
        let first = generator.generate("https://example.com").await.unwrap();
        let second = generator.generate("https://example.com").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_live_path_assembles_samples_in_issue_order() {
        let stub = StubBackend::scripted(vec![sample_draft()]);
        let generator =
            BrandProfileGenerator::new(Backend::live(stub.clone()), studio_config());

        let brand = generator.generate("https://tidewater.example").await.unwrap();

        assert_eq!(brand.name, "Tidewater Surf Supply");
        assert_eq!(brand.colors.len(), 4);
        assert_eq!(brand.sample_images.len(), 5);

        // The stub echoes each prompt back as the image payload, so the
        // positional correspondence between descriptions and images is
        // directly observable.
        let descriptions = sample_draft()["imageDescriptions"].clone();
        for (index, image) in brand.sample_images.iter().enumerate() {
            let (mime, bytes) = image.decode_embedded().unwrap();
            assert_eq!(mime, "image/jpeg");
            let prompt = String::from_utf8(bytes).unwrap();
            assert!(prompt.starts_with(descriptions[index].as_str().unwrap()));
            assert!(prompt.contains("Do not include any text or logos"));
        }

        // First image call is the logo: square, PNG, styled as a flat icon.
        let requests = stub.image_requests();
        assert_eq!(requests[0].aspect_ratio, "1:1");
        assert_eq!(requests[0].output_format.mime_type(), "image/png");
        assert!(requests[0].prompt.contains("flat icon"));
    }

    #[tokio::test]
    async fn test_live_fan_out_fails_as_a_unit() {
        // Image call 0 is the logo; fail the third sample render.
        let stub = StubBackend::with_failures(vec![sample_draft()], [3]);
        let generator =
            BrandProfileGenerator::new(Backend::live(stub), studio_config());

        let err = generator.generate("https://tidewater.example").await.unwrap_err();
        assert!(matches!(err, ForgeError::BrandProfile(_)));
    }

    #[tokio::test]
    async fn test_live_rejects_wrong_palette_size() {
        let mut draft = sample_draft();
        draft["colors"] = json!(["#013A63", "#61A5C2"]);
        let stub = StubBackend::scripted(vec![draft]);
        let generator =
            BrandProfileGenerator::new(Backend::live(stub), studio_config());

        let err = generator.generate("https://tidewater.example").await.unwrap_err();
        match err {
            ForgeError::BrandProfile(msg) => assert!(msg.contains("4 colors")),
            other => panic!("expected BrandProfile error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_live_rejects_blank_identity_fields() {
        let mut draft = sample_draft();
        draft["tagline"] = json!("   ");
        let stub = StubBackend::scripted(vec![draft]);
        let generator =
            BrandProfileGenerator::new(Backend::live(stub), studio_config());

        let err = generator.generate("https://tidewater.example").await.unwrap_err();
        assert_eq!(err.stage(), "brand profile");
    }

    #[tokio::test]
    async fn test_structured_failure_surfaces_as_stage_error() {
        let stub = StubBackend::scripted(vec![]);
        let generator =
            BrandProfileGenerator::new(Backend::live(stub), studio_config());

        let err = generator.generate("https://tidewater.example").await.unwrap_err();
        assert_eq!(err.stage(), "brand profile");
    }
}
