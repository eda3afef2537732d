//! Ticket orchestrator.
//!
//! Drives each ticket through the stage sequence, checkpointing the session
//! after every stage:
//! - **Validation** happens before a session exists
//! - **Pause** is honoured at stage boundaries; `resume_ticket` continues from the checkpoint
//! - **Failures** inside the sequence become escalated results

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::TicketOrchestrator;
pub use types::{PipelineError, ProcessResult};
