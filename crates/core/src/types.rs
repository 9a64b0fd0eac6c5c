//! Domain entities for the brand-to-creative pipeline.
//!
//! The pipeline owns one [`BrandIdentity`], one selected [`CampaignIdea`],
//! and a collection of [`Creative`]s per session. [`CreativeDisplay`] is
//! view state owned by the presentation layer and is deliberately kept out
//! of the [`Creative`] entity.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Image references
// ---------------------------------------------------------------------------

/// An opaque, transportable reference to an image: either a `data:` URI
/// embedding a base64 payload with its MIME type, or an external URL.
/// Consumers treat both forms interchangeably; the generation pipeline
/// never decodes or validates the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wrap an external URL.
    pub fn url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Build a `data:` URI from an already base64-encoded payload.
    pub fn embedded(mime_type: &str, base64_payload: &str) -> Self {
        Self(format!("data:{};base64,{}", mime_type, base64_payload))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_embedded(&self) -> bool {
        self.0.starts_with("data:")
    }

    /// Decode an embedded reference into `(mime_type, bytes)`.
    ///
    /// Returns `None` for external URLs or malformed `data:` URIs. Only the
    /// export path uses this; nothing on the generation path decodes.
    pub fn decode_embedded(&self) -> Option<(String, Vec<u8>)> {
        let rest = self.0.strip_prefix("data:")?;
        let (mime_type, payload) = rest.split_once(";base64,")?;
        let bytes = BASE64.decode(payload).ok()?;
        Some((mime_type.to_string(), bytes))
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Size presets
// ---------------------------------------------------------------------------

/// Creative size preset, controlling the aspect ratio requested from the
/// image backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizePreset {
    Square,
    Story,
    Banner,
}

impl SizePreset {
    /// The aspect ratio sent to the rendering backend. This mapping is
    /// authoritative: the backend keys on these exact strings.
    pub fn aspect_ratio(self) -> &'static str {
        match self {
            SizePreset::Square => "1:1",
            SizePreset::Story => "9:16",
            SizePreset::Banner => "16:9",
        }
    }
}

impl fmt::Display for SizePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SizePreset::Square => "Square",
            SizePreset::Story => "Story",
            SizePreset::Banner => "Banner",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// The synthesized brand profile ("Business DNA") derived from a website
/// URL. Created once per session and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandIdentity {
    pub name: String,
    pub website_url: String,
    pub tagline: String,
    pub tone: String,
    /// Brand palette as hex strings. Always exactly 4 entries.
    pub colors: Vec<String>,
    pub logo_image: ImageRef,
    /// Sample imagery in generation order. 5 entries on the live path; the
    /// mock record carries 4.
    pub sample_images: Vec<ImageRef>,
}

/// One candidate marketing campaign: a headline plus a short description
/// of the campaign's goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignIdea {
    pub headline: String,
    pub description: String,
}

/// One rendered visual asset for a chosen campaign at a specific size
/// preset. The headline is copied from the originating campaign idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creative {
    pub id: Uuid,
    pub image_url: ImageRef,
    pub headline: String,
    pub size_preset: SizePreset,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Display overlay (view state)
// ---------------------------------------------------------------------------

/// Overlay text size steps offered by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontSize {
    Small,
    Medium,
    Large,
}

/// Per-creative display customization: headline visibility, font size, and
/// overlay text color. Owned by the presentation layer, keyed by creative
/// id, and discarded whenever the creative collection is replaced. Never
/// part of the [`Creative`] entity itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeDisplay {
    pub show_headline: bool,
    pub font_size: FontSize,
    pub text_color: String,
}

impl CreativeDisplay {
    /// Default overlay for a brand: headline on, medium text, colored with
    /// the brand's secondary palette entry (white when absent).
    pub fn for_brand(brand: &BrandIdentity) -> Self {
        Self {
            show_headline: true,
            font_size: FontSize::Medium,
            text_color: brand
                .colors
                .get(1)
                .cloned()
                .unwrap_or_else(|| "#FFFFFF".to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_mapping_is_exact() {
        assert_eq!(SizePreset::Square.aspect_ratio(), "1:1");
        assert_eq!(SizePreset::Story.aspect_ratio(), "9:16");
        assert_eq!(SizePreset::Banner.aspect_ratio(), "16:9");
    }

    #[test]
    fn test_image_ref_embedded_roundtrip() {
        let payload = BASE64.encode(b"not-a-real-jpeg");
        let image = ImageRef::embedded("image/jpeg", &payload);

        assert!(image.is_embedded());
        assert!(image.as_str().starts_with("data:image/jpeg;base64,"));

        let (mime, bytes) = image.decode_embedded().unwrap();
        assert_eq!(mime, "image/jpeg");
        assert_eq!(bytes, b"not-a-real-jpeg");
    }

    #[test]
    fn test_image_ref_external_url_does_not_decode() {
        let image = ImageRef::url("https://picsum.photos/id/1060/400/400");
        assert!(!image.is_embedded());
        assert!(image.decode_embedded().is_none());
    }

    #[test]
    fn test_size_preset_serializes_as_variant_name() {
        let json = serde_json::to_string(&SizePreset::Story).unwrap();
        assert_eq!(json, "\"Story\"");
        let back: SizePreset = serde_json::from_str("\"Banner\"").unwrap();
        assert_eq!(back, SizePreset::Banner);
    }

    #[test]
    fn test_display_defaults_use_secondary_brand_color() {
        let brand = BrandIdentity {
            name: "Acme".to_string(),
            website_url: "https://acme.test".to_string(),
            tagline: "Everything for coyotes".to_string(),
            tone: "playful".to_string(),
            colors: vec!["#111111".to_string(), "#F5F1ED".to_string()],
            logo_image: ImageRef::url("https://cdn.acme.test/logo.png"),
            sample_images: vec![],
        };

        let display = CreativeDisplay::for_brand(&brand);
        assert!(display.show_headline);
        assert_eq!(display.font_size, FontSize::Medium);
        assert_eq!(display.text_color, "#F5F1ED");
    }
}
