//! Generator configuration and construction.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::generator::gemini::GeminiClient;
use crate::generator::ollama::OllamaClient;
use crate::generator::traits::{GeneratorError, ResponseGenerator};

/// Environment variable consulted when no Gemini API key is configured.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Generator provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorProvider {
    /// Google Gemini API.
    Gemini,
    /// Local Ollama instance.
    Ollama,
}

impl GeneratorProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorProvider::Gemini => "gemini",
            GeneratorProvider::Ollama => "ollama",
        }
    }
}

/// Response generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub provider: GeneratorProvider,
    /// Model name/identifier.
    pub model: String,
    /// API key. Gemini falls back to `GEMINI_API_KEY` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_timeout() -> u32 {
    20
}

fn default_max_tokens() -> u32 {
    512
}

fn default_temperature() -> f32 {
    0.2
}

impl GeneratorConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("generator.model cannot be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("generator.timeout_secs cannot be 0".to_string());
        }
        if self.max_tokens == 0 {
            return Err("generator.max_tokens cannot be 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "generator.temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            ));
        }
        Ok(())
    }

    fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(GEMINI_API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }
}

/// Build the generator described by the configuration.
pub fn build_generator(
    config: &GeneratorConfig,
) -> Result<Arc<dyn ResponseGenerator>, GeneratorError> {
    config.validate().map_err(GeneratorError::NotConfigured)?;

    let generator: Arc<dyn ResponseGenerator> = match config.provider {
        GeneratorProvider::Gemini => {
            let api_key = config.resolve_api_key().ok_or_else(|| {
                GeneratorError::NotConfigured(format!(
                    "gemini requires generator.api_key or {}",
                    GEMINI_API_KEY_ENV
                ))
            })?;
            let mut client = GeminiClient::new(api_key, &config.model, config.timeout_secs)?;
            if let Some(base) = &config.api_base {
                client = client.with_api_base(base);
            }
            Arc::new(client)
        }
        GeneratorProvider::Ollama => {
            let mut client = OllamaClient::new(&config.model, config.timeout_secs)?;
            if let Some(base) = &config.api_base {
                client = client.with_api_base(base);
            }
            Arc::new(client)
        }
    };

    tracing::info!(
        provider = generator.provider(),
        model = generator.model(),
        "Response generator configured"
    );
    Ok(generator)
}
