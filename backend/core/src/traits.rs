use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// An uploaded menu photograph.
#[derive(Debug, Clone)]
pub struct MenuImage {
    pub mime_type: String,
    pub data: Bytes,
}

impl MenuImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

/// Request to a multimodal completion capability.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub instructions: String,
    pub images: Vec<MenuImage>,
}

/// Free-form text returned by the capability.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    pub latency_ms: u64,
}

/// A vision-capable model that reads images and answers with text.
///
/// One call is one outbound request; implementations never retry.
#[async_trait]
pub trait VisionClient: Send + Sync {
    /// Provider name (e.g., "openai", "gemini").
    fn name(&self) -> &str;

    /// Submit the instructions plus all images and return the raw text output.
    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse>;
}
