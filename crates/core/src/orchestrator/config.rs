//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the ticket orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Upper bound for one specialist call, generator included (milliseconds).
    /// A specialist that runs longer escalates the ticket.
    #[serde(default = "default_specialist_timeout")]
    pub specialist_timeout_ms: u64,

    /// Tickets processed at once by `process_batch`.
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
}

fn default_specialist_timeout() -> u64 {
    5000 // 5 seconds
}

fn default_batch_concurrency() -> usize {
    8
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            specialist_timeout_ms: default_specialist_timeout(),
            batch_concurrency: default_batch_concurrency(),
        }
    }
}
