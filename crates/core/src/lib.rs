pub mod config;
pub mod generator;
pub mod matching;
pub mod memory;
pub mod metrics;
pub mod orchestrator;
pub mod session;
pub mod stages;
pub mod testing;
pub mod ticket;
pub mod tools;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LoggingConfig,
    SanitizedConfig,
};
pub use generator::{GeneratorConfig, GeneratorProvider, ResponseGenerator};
pub use memory::{CustomerContext, InMemoryBank, MemoryBank, MemoryConfig, MemoryRecord};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use orchestrator::{OrchestratorConfig, PipelineError, ProcessResult, TicketOrchestrator};
pub use session::{PipelineStage, SessionState, SessionTracker};
pub use stages::{AgentKind, RuleTable, SpecialistKind};
pub use ticket::{Ticket, TicketCategory, TicketStatus, ValidationError};
pub use tools::{
    CustomerDirectory, CustomerProfile, CustomerTier, KnowledgeBase, StaticCrm,
    StaticKnowledgeBase,
};
