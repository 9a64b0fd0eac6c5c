//! Deterministic responses for the credential-less degraded mode.
//!
//! The brand record and idea batch are fixed so repeated runs are
//! structurally identical; placeholder creative images are seeded with a
//! fresh random identifier so repeated renders stay visually distinct.

use forge_core::types::{BrandIdentity, CampaignIdea, ImageRef};
use rand::distributions::Alphanumeric;
use rand::Rng;

pub const BRAND_NAME: &str = "Wanderlust Coffee Co.";
pub const BRAND_TAGLINE: &str = "Your adventure in a cup.";
pub const BRAND_TONE: &str = "Adventurous, warm, and artisanal";
pub const BRAND_COLORS: [&str; 4] = ["#362222", "#F5F1ED", "#A38560", "#EFEFEF"];

const LOGO_URL: &str = "https://i.imgur.com/sPEkdEg.png";

// The mock record ships 4 sample images where the live path renders 5.
const SAMPLE_IMAGE_URLS: [&str; 4] = [
    "https://picsum.photos/id/1060/400/400",
    "https://picsum.photos/id/225/400/400",
    "https://picsum.photos/id/1025/400/400",
    "https://picsum.photos/id/1080/400/400",
];

/// The fixed brand record returned for any scanned URL.
pub fn brand_identity(website_url: &str) -> BrandIdentity {
    BrandIdentity {
        name: BRAND_NAME.to_string(),
        website_url: website_url.to_string(),
        tagline: BRAND_TAGLINE.to_string(),
        tone: BRAND_TONE.to_string(),
        colors: BRAND_COLORS.iter().map(|c| c.to_string()).collect(),
        logo_image: ImageRef::url(LOGO_URL),
        sample_images: SAMPLE_IMAGE_URLS.iter().map(|url| ImageRef::url(*url)).collect(),
    }
}

/// The fixed three-idea batch.
pub fn campaign_ideas() -> Vec<CampaignIdea> {
    vec![
        CampaignIdea {
            headline: "Escape the 9-to-5".to_string(),
            description: "A campaign focused on remote work and finding your passion with our coffee."
                .to_string(),
        },
        CampaignIdea {
            headline: "Artisan's Choice".to_string(),
            description: "Highlighting the quality and craft behind our single-origin beans."
                .to_string(),
        },
        CampaignIdea {
            headline: "Black Friday Fuel".to_string(),
            description: "A special promotion to power through the holiday shopping season."
                .to_string(),
        },
    ]
}

/// A placeholder creative image seeded with a fresh random identifier.
pub fn placeholder_image() -> ImageRef {
    let seed: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    ImageRef::url(format!("https://picsum.photos/seed/{seed}/600/600"))
}
