//! Provider transports — the only code that speaks a provider's wire format.
//!
//! ARCHITECTURAL RULE: no module outside the gateway may call a provider API
//! directly. Providers are values behind the `ProviderTransport` trait, keyed
//! by the prefix of the model identifier (`anthropic/...`, `openai/...`).

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

// ────────────────────────────────────────────────────────────────────────────
// Request / reply / error
// ────────────────────────────────────────────────────────────────────────────

/// A provider-agnostic completion request. `model` is the bare model name,
/// without the provider prefix.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub images: Vec<Vec<u8>>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub response_json: bool,
}

#[derive(Debug, Clone)]
pub struct ProviderReply {
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Classified provider failure. The gateway's retry discipline keys off
/// these variants: only `RateLimited` is retried on the same model.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("rate limited (429)")]
    RateLimited,

    #[error("service unavailable ({status})")]
    Unavailable { status: u16 },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => ProviderError::RateLimited,
            503 | 529 => ProviderError::Unavailable { status },
            _ => ProviderError::Api {
                status,
                message: body,
            },
        }
    }
}

#[async_trait]
pub trait ProviderTransport: Send + Sync {
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderReply, ProviderError>;

    fn name(&self) -> &'static str;

    /// Whether the provider honours a cacheable system prefix. When false,
    /// callers surface a "prompt caching unavailable" warning.
    fn supports_prompt_caching(&self) -> bool;
}

/// Detects the media type of uploaded image bytes from magic numbers.
pub fn detect_media_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        "image/jpeg"
    } else if bytes.starts_with(b"\x89PNG") {
        "image/png"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/png"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Anthropic
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

pub struct AnthropicTransport {
    client: reqwest::Client,
    api_key: String,
}

impl AnthropicTransport {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl ProviderTransport for AnthropicTransport {
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderReply, ProviderError> {
        let mut content: Vec<serde_json::Value> = Vec::new();
        for image in &request.images {
            content.push(json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": detect_media_type(image),
                    "data": base64::engine::general_purpose::STANDARD.encode(image),
                },
            }));
        }
        content.push(json!({"type": "text", "text": request.user}));

        // The shared system prefix is marked cacheable so repeated calls
        // reuse the provider-side prompt cache.
        let body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "system": [{
                "type": "text",
                "text": request.system,
                "cache_control": {"type": "ephemeral"},
            }],
            "messages": [{"role": "user", "content": content}],
        });

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let text = parsed
            .content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.clone())
            .ok_or_else(|| ProviderError::Malformed("no text block in response".to_string()))?;

        debug!(
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "anthropic call succeeded"
        );

        Ok(ProviderReply {
            content: text,
            input_tokens: parsed.usage.input_tokens,
            output_tokens: parsed.usage.output_tokens,
        })
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn supports_prompt_caching(&self) -> bool {
        true
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: OpenAiUsage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OpenAiResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

pub struct OpenAiTransport {
    client: reqwest::Client,
    api_key: String,
}

impl OpenAiTransport {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl ProviderTransport for OpenAiTransport {
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderReply, ProviderError> {
        let user_content: serde_json::Value = if request.images.is_empty() {
            json!(request.user)
        } else {
            let mut parts = vec![json!({"type": "text", "text": request.user})];
            for image in &request.images {
                let encoded = base64::engine::general_purpose::STANDARD.encode(image);
                parts.push(json!({
                    "type": "image_url",
                    "image_url": {
                        "url": format!("data:{};base64,{encoded}", detect_media_type(image)),
                    },
                }));
            }
            json!(parts)
        };

        let mut body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": user_content},
            ],
        });
        if request.response_json {
            body["response_format"] = serde_json::to_value(OpenAiResponseFormat {
                format_type: "json_object",
            })
            .unwrap_or_default();
        }

        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let parsed: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let text = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| ProviderError::Malformed("empty choices in response".to_string()))?;

        Ok(ProviderReply {
            content: text,
            input_tokens: parsed.usage.prompt_tokens,
            output_tokens: parsed.usage.completion_tokens,
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }

    fn supports_prompt_caching(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_media_type_magic_bytes() {
        assert_eq!(detect_media_type(&[0xff, 0xd8, 0xff, 0xe0]), "image/jpeg");
        assert_eq!(detect_media_type(b"\x89PNG\r\n\x1a\n"), "image/png");
        assert_eq!(detect_media_type(b"GIF89a-more"), "image/gif");
        assert_eq!(detect_media_type(b"RIFF\x00\x00\x00\x00WEBPVP8 "), "image/webp");
        assert_eq!(detect_media_type(b"unknown"), "image/png");
    }

    #[test]
    fn test_error_classification_from_status() {
        assert!(matches!(
            ProviderError::from_status(429, String::new()),
            ProviderError::RateLimited
        ));
        assert!(matches!(
            ProviderError::from_status(503, String::new()),
            ProviderError::Unavailable { status: 503 }
        ));
        assert!(matches!(
            ProviderError::from_status(400, String::new()),
            ProviderError::Api { status: 400, .. }
        ));
    }
}
