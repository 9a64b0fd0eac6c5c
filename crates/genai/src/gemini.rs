//! REST client for the Google generative language API: structured text
//! generation via `generateContent` and image generation via `predict`.

use std::time::Duration;

use async_trait::async_trait;
use forge_core::config::GenAiConfig;
use forge_core::{ForgeError, ForgeResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::ResponseSchema;
use crate::types::{GeneratedImage, ImageRequest};
use crate::GenerativeBackend;

pub struct GeminiBackend {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl GeminiBackend {
    pub fn new(config: &GenAiConfig) -> ForgeResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ForgeError::Config("generative backend requires an API key".into()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ForgeError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    async fn post_json<Req, Resp>(&self, url: &str, body: &Req) -> ForgeResult<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ForgeError::Backend(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ForgeError::Backend(format!(
                "backend returned {}: {}",
                status,
                truncate(&detail, 200)
            )));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| ForgeError::Backend(format!("failed to decode response: {e}")))
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &ResponseSchema,
    ) -> ForgeResult<serde_json::Value> {
        debug!(model = %self.text_model, "requesting structured generation");

        let url = format!("{}/models/{}:generateContent", self.base_url, self.text_model);
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            },
        };

        let response: GenerateContentResponse = self.post_json(&url, &request).await?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| ForgeError::Backend("empty structured-generation response".into()))?;

        serde_json::from_str(text.trim())
            .map_err(|e| ForgeError::Backend(format!("structured response was not valid JSON: {e}")))
    }

    async fn generate_image(&self, request: &ImageRequest) -> ForgeResult<GeneratedImage> {
        debug!(
            model = %self.image_model,
            aspect_ratio = request.aspect_ratio,
            "requesting image generation"
        );

        let url = format!("{}/models/{}:predict", self.base_url, self.image_model);
        let body = PredictRequest {
            instances: vec![Instance {
                prompt: &request.prompt,
            }],
            parameters: ImageParameters {
                sample_count: request.sample_count,
                aspect_ratio: request.aspect_ratio,
                output_mime_type: request.output_format.mime_type(),
            },
        };

        let response: PredictResponse = self.post_json(&url, &body).await?;

        let prediction = response
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| ForgeError::Backend("image response contained no predictions".into()))?;

        Ok(GeneratedImage {
            base64_data: prediction.bytes_base64_encoded,
            mime_type: prediction
                .mime_type
                .unwrap_or_else(|| request.output_format.mime_type().to_string()),
        })
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ─── Wire types ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig<'a> {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    #[serde(rename = "responseSchema")]
    response_schema: &'a ResponseSchema,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: Vec<Instance<'a>>,
    parameters: ImageParameters<'a>,
}

#[derive(Serialize)]
struct Instance<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
struct ImageParameters<'a> {
    #[serde(rename = "sampleCount")]
    sample_count: u32,
    #[serde(rename = "aspectRatio")]
    aspect_ratio: &'a str,
    #[serde(rename = "outputMimeType")]
    output_mime_type: &'static str,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: String,
    #[serde(default)]
    mime_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate_content_response() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "[{\"headline\": \"Go\", \"description\": \"Now\"}]"}]}}
            ]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let text = &response.candidates[0].content.parts[0].text;
        let value: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(value[0]["headline"], "Go");
    }

    #[test]
    fn test_parse_predict_response() {
        let raw = r#"{
            "predictions": [
                {"bytesBase64Encoded": "aGVsbG8=", "mimeType": "image/jpeg"}
            ]
        }"#;
        let response: PredictResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.predictions[0].bytes_base64_encoded, "aGVsbG8=");
        assert_eq!(response.predictions[0].mime_type.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn test_image_parameters_wire_names() {
        let params = ImageParameters {
            sample_count: 1,
            aspect_ratio: "9:16",
            output_mime_type: "image/jpeg",
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["sampleCount"], 1);
        assert_eq!(json["aspectRatio"], "9:16");
        assert_eq!(json["outputMimeType"], "image/jpeg");
    }
}
