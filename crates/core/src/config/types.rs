use serde::{Deserialize, Serialize};

use crate::generator::{GeneratorConfig, GeneratorProvider};
use crate::memory::MemoryConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::stages::IntakeConfig;
use crate::tools::{CrmConfig, KnowledgeBaseConfig};

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub intake: IntakeConfig,
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,
    #[serde(default)]
    pub crm: CrmConfig,
    /// Language-model generator. Specialists use templates when absent.
    #[serde(default)]
    pub generator: Option<GeneratorConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub orchestrator: OrchestratorConfig,
    pub memory: MemoryConfig,
    pub intake_rules: usize,
    pub knowledge_base_topics: usize,
    pub crm_profiles: usize,
    pub generator: Option<SanitizedGeneratorConfig>,
    pub logging: LoggingConfig,
}

/// Sanitized generator config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGeneratorConfig {
    pub provider: GeneratorProvider,
    pub model: String,
    pub api_base: Option<String>,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            orchestrator: config.orchestrator.clone(),
            memory: config.memory.clone(),
            intake_rules: config.intake.rules.len(),
            knowledge_base_topics: config.knowledge_base.table().len(),
            crm_profiles: config.crm.profiles.len(),
            generator: config.generator.as_ref().map(|g| SanitizedGeneratorConfig {
                provider: g.provider,
                model: g.model.clone(),
                api_base: g.api_base.clone(),
                api_key_configured: g.api_key.as_deref().is_some_and(|k| !k.is_empty()),
                timeout_secs: g.timeout_secs,
            }),
            logging: config.logging.clone(),
        }
    }
}
