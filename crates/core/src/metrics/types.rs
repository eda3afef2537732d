//! Metrics snapshot types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::session::PipelineStage;
use crate::stages::AgentKind;
use crate::ticket::TicketCategory;

/// Accumulated timing for one pipeline stage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct StageTiming {
    pub count: u64,
    pub total_ms: f64,
}

impl StageTiming {
    pub fn average_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }
}

/// Point-in-time view of pipeline metrics.
///
/// Derived values are computed on read. Maps are ordered, so two snapshots
/// taken without processing in between compare equal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricsSnapshot {
    pub tickets_processed: u64,
    pub tickets_resolved: u64,
    pub tickets_escalated: u64,
    /// Resolved / processed, 0.0 when nothing was processed.
    pub resolution_rate: f64,
    pub category_distribution: BTreeMap<TicketCategory, u64>,
    pub agent_invocations: BTreeMap<AgentKind, u64>,
    pub average_processing_ms: f64,
    pub total_processing_ms: f64,
    pub average_quality: f64,
    pub stage_timings: BTreeMap<PipelineStage, StageTiming>,
    pub processing_samples: usize,
    pub quality_samples: usize,
}

impl MetricsSnapshot {
    /// Resolution rate as a percentage.
    pub fn resolution_rate_percent(&self) -> f64 {
        self.resolution_rate * 100.0
    }
}
