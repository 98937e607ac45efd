use std::env;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{CareerGraphError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LlmConfig {
    /// When disabled the pipeline runs fully deterministic fallbacks.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "LlmConfig::default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "LlmConfig::default_temperature")]
    pub temperature: f32,
    #[serde(default = "LlmConfig::default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "LlmConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl LlmConfig {
    fn default_provider() -> String {
        "gemini".to_string()
    }

    fn default_temperature() -> f32 {
        0.2
    }

    fn default_max_tokens() -> usize {
        8192
    }

    fn default_timeout_secs() -> u64 {
        8
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: Self::default_provider(),
            model: None,
            api_key: None,
            temperature: Self::default_temperature(),
            max_tokens: Self::default_max_tokens(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// External data source endpoints and credentials. Base URLs are
/// configurable so tests can point clients at a local mock.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SourcesConfig {
    #[serde(default, skip_serializing)]
    pub scorecard_api_key: Option<String>,
    #[serde(default = "SourcesConfig::default_scorecard_base_url")]
    pub scorecard_base_url: String,
    #[serde(default, skip_serializing)]
    pub bls_api_key: Option<String>,
    #[serde(default = "SourcesConfig::default_bls_base_url")]
    pub bls_base_url: String,
    #[serde(default, skip_serializing)]
    pub search_api_key: Option<String>,
    #[serde(default)]
    pub search_engine_id: Option<String>,
    #[serde(default = "SourcesConfig::default_search_base_url")]
    pub search_base_url: String,
    #[serde(default = "SourcesConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SourcesConfig {
    fn default_scorecard_base_url() -> String {
        "https://api.data.gov/ed/collegescorecard/v1".to_string()
    }

    fn default_bls_base_url() -> String {
        "https://api.bls.gov/publicAPI/v2".to_string()
    }

    fn default_search_base_url() -> String {
        "https://www.googleapis.com/customsearch/v1".to_string()
    }

    fn default_timeout_secs() -> u64 {
        8
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            scorecard_api_key: None,
            scorecard_base_url: Self::default_scorecard_base_url(),
            bls_api_key: None,
            bls_base_url: Self::default_bls_base_url(),
            search_api_key: None,
            search_engine_id: None,
            search_base_url: Self::default_search_base_url(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    /// Optional path to a seed-data override file.
    #[serde(default)]
    pub seed_file: Option<String>,
}

impl Settings {
    /// Load settings from an optional TOML file, then apply environment
    /// overrides. A missing file is a configuration error; `None` starts
    /// from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)?;
                toml::from_str(&raw)
                    .map_err(|e| CareerGraphError::Config(format!("{}: {}", p.display(), e)))?
            }
            None => Settings::default(),
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = env::var("CAREERGRAPH_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env::var("CAREERGRAPH_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(key) = env::var("GEMINI_API_KEY") {
            self.llm.api_key = Some(key);
            self.llm.enabled = true;
        }
        if let Ok(key) = env::var("SCORECARD_API_KEY") {
            self.sources.scorecard_api_key = Some(key);
        }
        if let Ok(key) = env::var("BLS_API_KEY") {
            self.sources.bls_api_key = Some(key);
        }
        if let Ok(key) = env::var("GOOGLE_SEARCH_API_KEY") {
            self.sources.search_api_key = Some(key);
        }
        if let Ok(id) = env::var("GOOGLE_SEARCH_ENGINE_ID") {
            self.sources.search_engine_id = Some(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert!(!settings.llm.enabled);
        assert_eq!(settings.llm.provider, "gemini");
        assert_eq!(settings.sources.timeout_secs, 8);
    }

    #[test]
    fn test_empty_toml_deserializes() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.server.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [llm]
            enabled = true
            model = "gemini-2.0-flash-exp"
            "#,
        )
        .unwrap();
        assert_eq!(settings.server.bind_address(), "0.0.0.0:9000");
        assert!(settings.llm.enabled);
        assert_eq!(settings.llm.temperature, 0.2);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9090").unwrap();
        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.server.port, 9090);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = Settings::load(Some(Path::new("/nonexistent/careergraph.toml")));
        assert!(result.is_err());
    }
}
