//! Scripted backends for exercising the live generation paths in tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use forge_core::{ForgeError, ForgeResult};
use forge_genai::{GeneratedImage, GenerativeBackend, ImageRequest, ResponseSchema};

/// A backend with a queue of canned structured responses. Image calls echo
/// the request prompt back as the (base64) payload so tests can observe
/// which prompt produced which image; selected image calls can be made to
/// fail by zero-based call index.
pub(crate) struct StubBackend {
    structured: Mutex<VecDeque<serde_json::Value>>,
    failing_image_calls: HashSet<usize>,
    image_calls: AtomicUsize,
    requests: Mutex<Vec<ImageRequest>>,
}

impl StubBackend {
    pub fn scripted(responses: Vec<serde_json::Value>) -> Arc<Self> {
        Self::with_failures(responses, [])
    }

    pub fn with_failures(
        responses: Vec<serde_json::Value>,
        failing: impl IntoIterator<Item = usize>,
    ) -> Arc<Self> {
        Arc::new(Self {
            structured: Mutex::new(responses.into()),
            failing_image_calls: failing.into_iter().collect(),
            image_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Every image request seen so far, in call order.
    pub fn image_requests(&self) -> Vec<ImageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeBackend for StubBackend {
    async fn generate_structured(
        &self,
        _prompt: &str,
        _schema: &ResponseSchema,
    ) -> ForgeResult<serde_json::Value> {
        self.structured
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ForgeError::Backend("no scripted structured response left".into()))
    }

    async fn generate_image(&self, request: &ImageRequest) -> ForgeResult<GeneratedImage> {
        let call = self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if self.failing_image_calls.contains(&call) {
            return Err(ForgeError::Backend(format!(
                "injected failure on image call {call}"
            )));
        }

        Ok(GeneratedImage {
            base64_data: BASE64.encode(request.prompt.as_bytes()),
            mime_type: request.output_format.mime_type().to_string(),
        })
    }
}
