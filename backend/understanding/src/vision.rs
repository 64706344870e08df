/// Vision understanding: send menu photographs plus instructions to a vision LLM.
///
/// Every image is inlined as base64 into a single request. No retries happen
/// here; callers decide what to do with a failure.
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use menuscan_core::{MenuImage, VisionClient, VisionRequest, VisionResponse};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Supported vision providers.
#[derive(Debug, Clone)]
pub enum VisionProvider {
    OpenAI { api_key: String, model: String, base_url: String },
    Gemini { api_key: String, model: String, base_url: String },
}

impl VisionProvider {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::OpenAI {
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self::Gemini {
            api_key: api_key.into(),
            model: "gemini-2.0-flash".to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, new_model: impl Into<String>) -> Self {
        match &mut self {
            Self::OpenAI { model, .. } | Self::Gemini { model, .. } => *model = new_model.into(),
        }
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        match &mut self {
            Self::OpenAI { base_url, .. } | Self::Gemini { base_url, .. } => {
                *base_url = url.into().trim_end_matches('/').to_string()
            }
        }
        self
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAI { .. } => "openai",
            Self::Gemini { .. } => "gemini",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } | Self::Gemini { model, .. } => model,
        }
    }
}

/// Vision client talking to a hosted model over HTTPS.
pub struct HttpVisionClient {
    client: Client,
    provider: VisionProvider,
    max_tokens: u32,
}

impl HttpVisionClient {
    pub fn new(provider: VisionProvider, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build vision HTTP client")?;
        Ok(Self {
            client,
            provider,
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }
}

fn data_url(image: &MenuImage) -> String {
    format!("data:{};base64,{}", image.mime_type, STANDARD.encode(&image.data))
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
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
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

async fn read_vision_output(
    client: &HttpVisionClient,
    request: &VisionRequest,
) -> Result<String> {
    match &client.provider {
        VisionProvider::OpenAI { api_key, model, base_url } => {
            let mut content = vec![serde_json::json!({ "type": "text", "text": request.instructions })];
            content.extend(request.images.iter().map(|image| {
                serde_json::json!({ "type": "image_url", "image_url": { "url": data_url(image) } })
            }));
            let body = serde_json::json!({
                "model": model,
                "messages": [{ "role": "user", "content": content }],
                "max_tokens": client.max_tokens,
            });

            let resp = client
                .client
                .post(format!("{base_url}/chat/completions"))
                .bearer_auth(api_key)
                .json(&body)
                .send()
                .await
                .context("OpenAI vision HTTP request failed")?;
            let status = resp.status();
            if !status.is_success() {
                bail!("OpenAI vision returned {}: {}", status, resp.text().await.unwrap_or_default());
            }
            let parsed: ChatResponse = resp
                .json()
                .await
                .context("Failed to parse OpenAI vision response")?;
            Ok(parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default())
        }
        VisionProvider::Gemini { api_key, model, base_url } => {
            let mut parts = vec![serde_json::json!({ "text": request.instructions })];
            parts.extend(request.images.iter().map(|image| {
                serde_json::json!({
                    "inlineData": { "mimeType": image.mime_type, "data": STANDARD.encode(&image.data) }
                })
            }));
            let body = serde_json::json!({
                "contents": [{ "parts": parts }],
                "generationConfig": { "maxOutputTokens": client.max_tokens },
            });

            let resp = client
                .client
                .post(format!("{base_url}/models/{model}:generateContent"))
                .query(&[("key", api_key.as_str())])
                .json(&body)
                .send()
                .await
                .context("Gemini vision HTTP request failed")?;
            let status = resp.status();
            if !status.is_success() {
                bail!("Gemini vision returned {}: {}", status, resp.text().await.unwrap_or_default());
            }
            let parsed: GenerateResponse = resp
                .json()
                .await
                .context("Failed to parse Gemini vision response")?;
            Ok(parsed
                .candidates
                .into_iter()
                .next()
                .map(|c| {
                    c.content
                        .parts
                        .into_iter()
                        .filter_map(|p| p.text)
                        .collect::<Vec<_>>()
                        .join("")
                })
                .unwrap_or_default())
        }
    }
}

#[async_trait]
impl VisionClient for HttpVisionClient {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse> {
        if request.images.is_empty() {
            bail!("vision request needs at least one image");
        }
        let start = Instant::now();
        let total_bytes: usize = request.images.iter().map(|i| i.data.len()).sum();
        info!(
            provider = self.provider.name(),
            model = %self.provider.model(),
            images = request.images.len(),
            total_bytes,
            "[Vision] Sending menu images"
        );

        let text = read_vision_output(self, request).await?;
        let latency_ms = start.elapsed().as_millis() as u64;
        debug!(chars = text.len(), latency_ms, "[Vision] Received response");

        Ok(VisionResponse {
            text,
            provider: self.provider.name().to_string(),
            model: self.provider.model().to_string(),
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn request() -> VisionRequest {
        VisionRequest {
            instructions: "Read the menu".into(),
            images: vec![
                MenuImage::new("image/jpeg", bytes::Bytes::from_static(b"one")),
                MenuImage::new("image/png", bytes::Bytes::from_static(b"two")),
            ],
        }
    }

    #[tokio::test]
    async fn openai_sends_all_images_inline() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .body_contains("data:image/jpeg;base64,b25l")
                    .body_contains("data:image/png;base64,dHdv")
                    .body_contains("Read the menu");
                then.status(200).json_body(serde_json::json!({
                    "choices": [{ "message": { "role": "assistant", "content": "{\"ok\":true}" } }]
                }));
            })
            .await;

        let provider = VisionProvider::openai("sk-test").with_base_url(server.base_url());
        let client = HttpVisionClient::new(provider, Duration::from_secs(5)).unwrap();
        let response = client.complete(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.text, "{\"ok\":true}");
        assert_eq!(response.provider, "openai");
        assert_eq!(response.model, "gpt-4o");
    }

    #[tokio::test]
    async fn gemini_joins_text_parts() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/gemini-2.0-flash:generateContent")
                    .query_param("key", "g-key")
                    .body_contains("\"mimeType\":\"image/png\"");
                then.status(200).json_body(serde_json::json!({
                    "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }]
                }));
            })
            .await;

        let provider = VisionProvider::gemini("g-key").with_base_url(server.base_url());
        let client = HttpVisionClient::new(provider, Duration::from_secs(5)).unwrap();
        let response = client.complete(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.text, "{\"a\":1}");
    }

    #[tokio::test]
    async fn upstream_error_status_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(429).body("rate limited");
            })
            .await;

        let provider = VisionProvider::openai("sk-test").with_base_url(server.base_url());
        let client = HttpVisionClient::new(provider, Duration::from_secs(5)).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        assert!(err.to_string().contains("429"), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn rejects_request_without_images() {
        let client =
            HttpVisionClient::new(VisionProvider::openai("sk-test"), Duration::from_secs(1)).unwrap();
        let empty = VisionRequest { instructions: "x".into(), images: vec![] };
        assert!(client.complete(&empty).await.is_err());
    }
}
