use std::sync::Arc;

use anyhow::{anyhow, Result};

use careergraph_core::LlmConfig;

use crate::gemini_provider::{GeminiConfig, GeminiProvider};
use crate::llm_provider::LlmProvider;

/// Factory for creating LLM providers based on configuration
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create an LLM provider from configuration. A disabled LLM is an
    /// error here; callers treat it as "run deterministic fallbacks only".
    pub fn create_from_config(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
        if !config.enabled {
            return Err(anyhow!("LLM is not enabled in configuration"));
        }

        match config.provider.to_lowercase().as_str() {
            "gemini" => Self::create_gemini_provider(config),
            other => Err(anyhow!(
                "Unsupported LLM provider: {}. Available providers: gemini",
                other
            )),
        }
    }

    fn create_gemini_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                anyhow!(
                    "Gemini API key not found. Set 'api_key' in config \
                     or GEMINI_API_KEY environment variable"
                )
            })?;

        let gemini_config = GeminiConfig {
            api_key,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| "gemini-2.0-flash-exp".to_string()),
            timeout_secs: config.timeout_secs,
            ..Default::default()
        };

        Ok(Arc::new(GeminiProvider::new(gemini_config)?))
    }

    /// Get a list of supported providers
    pub fn supported_providers() -> Vec<&'static str> {
        vec!["gemini"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_llm() {
        let config = LlmConfig {
            enabled: false,
            ..Default::default()
        };

        let result = LlmProviderFactory::create_from_config(&config);
        assert!(result.is_err());
        assert!(result
            .err()
            .unwrap()
            .to_string()
            .contains("LLM is not enabled"));
    }

    #[test]
    fn test_gemini_provider_creation() {
        let config = LlmConfig {
            enabled: true,
            provider: "gemini".to_string(),
            model: Some("gemini-2.0-flash-exp".to_string()),
            api_key: Some("test-key".to_string()),
            ..Default::default()
        };

        let result = LlmProviderFactory::create_from_config(&config);
        assert!(result.is_ok());
    }

    #[test]
    fn test_unknown_provider() {
        let config = LlmConfig {
            enabled: true,
            provider: "palmtree".to_string(),
            api_key: Some("k".to_string()),
            ..Default::default()
        };

        assert!(LlmProviderFactory::create_from_config(&config).is_err());
    }
}
