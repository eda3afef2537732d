//! Memory bank data types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ticket::TicketCategory;
use crate::tools::{CustomerProfile, CustomerTier};

/// Errors from memory bank backends.
///
/// The in-memory bank never produces these; durable backends may.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("memory backend unavailable: {0}")]
    Unavailable(String),
}

/// Memory bank configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Number of raw records returned in a customer context.
    /// Older history is compacted into a summary.
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Maximum similar resolutions a specialist looks at.
    #[serde(default = "default_similar_limit")]
    pub similar_limit: usize,

    /// Minimum quality for a past resolution to be referenced in new responses.
    #[serde(default = "default_similar_min_quality")]
    pub similar_min_quality: f32,
}

fn default_context_window() -> usize {
    5
}

fn default_similar_limit() -> usize {
    3
}

fn default_similar_min_quality() -> f32 {
    4.0
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            similar_limit: default_similar_limit(),
            similar_min_quality: default_similar_min_quality(),
        }
    }
}

/// One entry per processed ticket. Write-once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryRecord {
    pub ticket_id: String,
    pub customer_id: String,
    pub category: TicketCategory,
    pub resolution_text: String,
    /// Rubric score in [0.0, 5.0].
    pub quality_score: f32,
    pub timestamp: DateTime<Utc>,
    /// Insertion order, assigned by the bank on store.
    #[serde(default)]
    pub sequence: u64,
}

impl MemoryRecord {
    pub fn new(
        ticket_id: impl Into<String>,
        customer_id: impl Into<String>,
        category: TicketCategory,
        resolution_text: impl Into<String>,
        quality_score: f32,
    ) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            customer_id: customer_id.into(),
            category,
            resolution_text: resolution_text.into(),
            quality_score,
            timestamp: Utc::now(),
            sequence: 0,
        }
    }
}

/// Aggregate of history beyond the context window.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HistorySummary {
    pub record_count: usize,
    pub category_counts: BTreeMap<TicketCategory, usize>,
    pub average_quality: f32,
}

impl HistorySummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a MemoryRecord>) -> Self {
        let mut summary = HistorySummary::default();
        let mut quality_total = 0.0f32;
        for record in records {
            summary.record_count += 1;
            *summary.category_counts.entry(record.category).or_insert(0) += 1;
            quality_total += record.quality_score;
        }
        if summary.record_count > 0 {
            summary.average_quality = quality_total / summary.record_count as f32;
        }
        summary
    }
}

/// Customer history assembled on demand. Never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomerContext {
    pub customer_id: String,
    /// Most recent first, bounded by the context window.
    pub recent: Vec<MemoryRecord>,
    /// Compacted history older than the window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<HistorySummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<CustomerTier>,
    #[serde(default)]
    pub flags: Vec<String>,
}

impl CustomerContext {
    /// Context for a customer with no history.
    pub fn empty(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            ..Default::default()
        }
    }

    /// Total number of prior tickets, including compacted ones.
    pub fn total_tickets(&self) -> usize {
        self.recent.len() + self.summary.as_ref().map_or(0, |s| s.record_count)
    }

    pub fn has_history(&self) -> bool {
        self.total_tickets() > 0
    }

    /// Attach CRM data (tier and flags).
    pub fn with_profile(mut self, profile: &CustomerProfile) -> Self {
        self.tier = Some(profile.tier);
        self.flags = profile.flags();
        self
    }

    pub fn references_ticket(&self, ticket_id: &str) -> bool {
        self.recent.iter().any(|r| r.ticket_id == ticket_id)
    }
}
