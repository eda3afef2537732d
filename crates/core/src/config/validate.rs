use super::{types::Config, ConfigError};
use crate::stages::RuleTable;
use crate::tools::StaticKnowledgeBase;

/// Validate configuration
/// Currently validates:
/// - Memory context window and similar-resolution limits
/// - Orchestrator timeout and batch concurrency are not 0
/// - Intake rules and knowledge base topics are well formed
/// - Generator settings are complete
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.memory.context_window == 0 {
        return Err(ConfigError::ValidationError(
            "memory.context_window cannot be 0".to_string(),
        ));
    }
    if !(0.0..=5.0).contains(&config.memory.similar_min_quality) {
        return Err(ConfigError::ValidationError(format!(
            "memory.similar_min_quality must be between 0.0 and 5.0, got {}",
            config.memory.similar_min_quality
        )));
    }

    if config.orchestrator.specialist_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.specialist_timeout_ms cannot be 0".to_string(),
        ));
    }
    if config.orchestrator.batch_concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.batch_concurrency cannot be 0".to_string(),
        ));
    }

    RuleTable::from_config(&config.intake)
        .map_err(|e| ConfigError::ValidationError(format!("intake.rules: {}", e)))?;

    let table = config.knowledge_base.table();
    if table.is_empty() {
        return Err(ConfigError::ValidationError(
            "knowledge_base has no topics (include_builtin = false and no entries)".to_string(),
        ));
    }
    StaticKnowledgeBase::new(table)
        .map_err(|e| ConfigError::ValidationError(format!("knowledge_base: {}", e)))?;

    if let Some(generator) = &config.generator {
        generator.validate().map_err(ConfigError::ValidationError)?;
    }

    Ok(())
}
