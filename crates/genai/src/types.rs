//! Request/response shapes shared by all backend implementations.

use forge_core::types::ImageRef;

/// Output encoding requested from the image backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// One image-generation request. The pipeline always asks for a single
/// image per request; batching is done by issuing concurrent requests.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub sample_count: u32,
    /// One of `1:1`, `9:16`, `16:9`.
    pub aspect_ratio: &'static str,
    pub output_format: ImageFormat,
}

impl ImageRequest {
    pub fn single(prompt: String, aspect_ratio: &'static str, output_format: ImageFormat) -> Self {
        Self {
            prompt,
            sample_count: 1,
            aspect_ratio,
            output_format,
        }
    }
}

/// A generated image as returned by the backend: a base64-encoded payload
/// plus its MIME type.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub base64_data: String,
    pub mime_type: String,
}

impl GeneratedImage {
    /// Wrap the payload as a displayable `data:` URI reference.
    pub fn into_image_ref(self) -> ImageRef {
        ImageRef::embedded(&self.mime_type, &self.base64_data)
    }
}
