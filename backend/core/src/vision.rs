use anyhow::Result;
use async_trait::async_trait;

/// Trait for vision-capable LLM providers.
///
/// The tag extraction service holds one of these behind an `Arc`, so tests
/// substitute a scripted fake without touching the network.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send one image plus instructions and return the model's reply text.
    async fn read_image(&self, request: &VisionRequest) -> Result<VisionResponse>;
}

/// Request to a vision provider: one inline image and the prompt pair.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    /// Base64-encoded image bytes, sent inline as a data URL.
    pub image_base64: String,
    pub mime_type: String,
    pub temperature: f32,
}

/// Reply from a vision provider.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub latency_ms: u64,
}
