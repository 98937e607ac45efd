use crate::llm_provider::*;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Configuration for the Gemini provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key for the Generative Language API
    pub api_key: String,
    /// Model to use (e.g., "gemini-2.0-flash-exp")
    pub model: String,
    /// API base URL (overridable for tests)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
            timeout_secs: 8,
        }
    }
}

/// Gemini LLM provider. Requests are single-attempt: a failed call is
/// answered by the caller's deterministic fallback, never by a retry.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(anyhow!(
                "Gemini API key is required. Set GEMINI_API_KEY environment variable."
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::default())
    }

    async fn send_request(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<GeminiResponse> {
        let system_instruction = messages
            .iter()
            .find(|m| matches!(m.role, MessageRole::System))
            .map(|m| GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            });

        let contents = messages
            .iter()
            .filter(|m| !matches!(m.role, MessageRole::System))
            .map(|m| GeminiContent {
                role: Some(match m.role {
                    MessageRole::Assistant => "model".to_string(),
                    _ => "user".to_string(),
                }),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        let request = GeminiRequest {
            contents,
            system_instruction,
            generation_config: GeminiGenerationConfig {
                temperature: config.temperature,
                top_p: config.top_p,
                max_output_tokens: config.max_tokens,
                stop_sequences: config.stop.clone(),
            },
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(anyhow!("Gemini API error ({}): {}", status, error_text));
        }

        response
            .json::<GeminiResponse>()
            .await
            .context("Failed to parse Gemini API response")
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> LlmResult<LlmResponse> {
        let response = self.send_request(messages, config).await?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Gemini response contained no candidates"))?;

        let content = candidate
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        let usage = response.usage_metadata.unwrap_or_default();

        Ok(LlmResponse {
            content,
            total_tokens: usage.total_token_count,
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: usage.candidates_token_count,
            finish_reason: candidate.finish_reason,
            model: self.config.model.clone(),
        })
    }

    fn is_available(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Gemini API request/response types

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "topP", skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: usize,
    #[serde(rename = "stopSequences", skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<usize>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<usize>,
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation_requires_api_key() {
        let config = GeminiConfig {
            api_key: String::new(),
            ..Default::default()
        };
        assert!(GeminiProvider::new(config).is_err());
    }

    #[test]
    fn test_provider_reports_model() {
        let config = GeminiConfig {
            api_key: "test-key".to_string(),
            ..Default::default()
        };
        let provider = GeminiProvider::new(config).unwrap();
        assert_eq!(provider.provider_name(), "gemini");
        assert_eq!(provider.model_name(), DEFAULT_MODEL);
        assert!(provider.is_available());
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "hello"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 2, "totalTokenCount": 12}
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].content.parts[0].text, "hello");
    }
}
