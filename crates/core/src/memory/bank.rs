//! Memory bank trait and in-memory implementation.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::memory::types::{
    CustomerContext, HistorySummary, MemoryConfig, MemoryError, MemoryRecord,
};
use crate::ticket::TicketCategory;

/// Trait for customer history backends.
///
/// Records are append-only. When several records share a ticket id, the most
/// recently stored one wins on every read.
#[async_trait]
pub trait MemoryBank: Send + Sync {
    /// Append a record.
    async fn store(&self, record: MemoryRecord) -> Result<(), MemoryError>;

    /// Customer history, most recent first, compacted beyond the context window.
    async fn get_customer_context(&self, customer_id: &str) -> CustomerContext;

    /// Highest quality records for a category, ties broken by recency.
    async fn get_similar_resolutions(
        &self,
        category: TicketCategory,
        limit: usize,
    ) -> Vec<MemoryRecord>;

    /// Latest record for a ticket id.
    async fn get_record(&self, ticket_id: &str) -> Option<MemoryRecord>;

    /// Number of raw records stored (duplicates included).
    async fn record_count(&self) -> usize;
}

/// Process-lifetime memory bank.
pub struct InMemoryBank {
    config: MemoryConfig,
    records: RwLock<Vec<MemoryRecord>>,
}

impl Default for InMemoryBank {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl InMemoryBank {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }
}

/// Records newest first, skipping ones superseded by a later record with the same ticket id.
fn latest_first<'a, F>(records: &'a [MemoryRecord], keep: F) -> Vec<&'a MemoryRecord>
where
    F: Fn(&MemoryRecord) -> bool,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for record in records.iter().rev() {
        if seen.insert(record.ticket_id.as_str()) && keep(record) {
            out.push(record);
        }
    }
    out
}

#[async_trait]
impl MemoryBank for InMemoryBank {
    async fn store(&self, mut record: MemoryRecord) -> Result<(), MemoryError> {
        let mut records = self.records.write().await;
        record.sequence = records.len() as u64;
        tracing::debug!(
            ticket_id = %record.ticket_id,
            customer_id = %record.customer_id,
            sequence = record.sequence,
            "Stored memory record"
        );
        records.push(record);
        Ok(())
    }

    async fn get_customer_context(&self, customer_id: &str) -> CustomerContext {
        let records = self.records.read().await;
        let history = latest_first(&records, |r| r.customer_id == customer_id);

        let window = self.config.context_window;
        let (recent, older) = history.split_at(history.len().min(window));

        CustomerContext {
            customer_id: customer_id.to_string(),
            recent: recent.iter().map(|r| (*r).clone()).collect(),
            summary: if older.is_empty() {
                None
            } else {
                Some(HistorySummary::from_records(older.iter().copied()))
            },
            tier: None,
            flags: Vec::new(),
        }
    }

    async fn get_similar_resolutions(
        &self,
        category: TicketCategory,
        limit: usize,
    ) -> Vec<MemoryRecord> {
        let records = self.records.read().await;
        let mut matches = latest_first(&records, |r| r.category == category);

        matches.sort_by(|a, b| {
            b.quality_score
                .total_cmp(&a.quality_score)
                .then(b.sequence.cmp(&a.sequence))
        });
        matches.into_iter().take(limit).cloned().collect()
    }

    async fn get_record(&self, ticket_id: &str) -> Option<MemoryRecord> {
        let records = self.records.read().await;
        records.iter().rev().find(|r| r.ticket_id == ticket_id).cloned()
    }

    async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ticket: &str, customer: &str, category: TicketCategory, quality: f32) -> MemoryRecord {
        MemoryRecord::new(ticket, customer, category, format!("resolution for {}", ticket), quality)
    }

    #[tokio::test]
    async fn test_empty_history_is_not_an_error() {
        let bank = InMemoryBank::default();
        let context = bank.get_customer_context("nobody").await;
        assert_eq!(context.customer_id, "nobody");
        assert!(context.recent.is_empty());
        assert!(context.summary.is_none());
        assert!(bank
            .get_similar_resolutions(TicketCategory::Billing, 5)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_context_is_most_recent_first() {
        let bank = InMemoryBank::default();
        for i in 1..=3 {
            bank.store(record(&format!("T-{}", i), "C1", TicketCategory::General, 3.0))
                .await
                .unwrap();
        }
        bank.store(record("T-other", "C2", TicketCategory::General, 3.0))
            .await
            .unwrap();

        let context = bank.get_customer_context("C1").await;
        let ids: Vec<&str> = context.recent.iter().map(|r| r.ticket_id.as_str()).collect();
        assert_eq!(ids, vec!["T-3", "T-2", "T-1"]);
    }

    #[tokio::test]
    async fn test_context_compacts_beyond_window() {
        let bank = InMemoryBank::new(MemoryConfig {
            context_window: 2,
            ..Default::default()
        });
        bank.store(record("T-1", "C", TicketCategory::Billing, 2.0)).await.unwrap();
        bank.store(record("T-2", "C", TicketCategory::Billing, 4.0)).await.unwrap();
        bank.store(record("T-3", "C", TicketCategory::Technical, 5.0)).await.unwrap();
        bank.store(record("T-4", "C", TicketCategory::General, 1.0)).await.unwrap();

        let context = bank.get_customer_context("C").await;
        assert_eq!(context.recent.len(), 2);
        assert_eq!(context.recent[0].ticket_id, "T-4");
        assert_eq!(context.recent[1].ticket_id, "T-3");

        let summary = context
            .summary
            .as_ref()
            .expect("older records should be summarized");
        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.category_counts[&TicketCategory::Billing], 2);
        assert!((summary.average_quality - 3.0).abs() < f32::EPSILON);
        assert_eq!(context.total_tickets(), 4);
    }

    #[tokio::test]
    async fn test_duplicate_ticket_id_most_recent_wins() {
        let bank = InMemoryBank::default();
        bank.store(MemoryRecord::new("T-1", "C", TicketCategory::General, "first", 1.0))
            .await
            .unwrap();
        bank.store(MemoryRecord::new("T-1", "C", TicketCategory::General, "second", 4.0))
            .await
            .unwrap();

        assert_eq!(bank.record_count().await, 2);

        let context = bank.get_customer_context("C").await;
        assert_eq!(context.recent.len(), 1);
        assert_eq!(context.recent[0].resolution_text, "second");

        let latest = bank.get_record("T-1").await.unwrap();
        assert_eq!(latest.resolution_text, "second");

        let similar = bank
            .get_similar_resolutions(TicketCategory::General, 10)
            .await;
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].quality_score, 4.0);
    }

    #[tokio::test]
    async fn test_similar_resolutions_ordering() {
        let bank = InMemoryBank::default();
        bank.store(record("T-1", "A", TicketCategory::Billing, 3.5)).await.unwrap();
        bank.store(record("T-2", "B", TicketCategory::Billing, 4.5)).await.unwrap();
        bank.store(record("T-3", "C", TicketCategory::Technical, 5.0)).await.unwrap();
        bank.store(record("T-4", "D", TicketCategory::Billing, 4.5)).await.unwrap();
        bank.store(record("T-5", "E", TicketCategory::Billing, 1.0)).await.unwrap();

        let similar = bank
            .get_similar_resolutions(TicketCategory::Billing, 3)
            .await;
        let ids: Vec<&str> = similar.iter().map(|r| r.ticket_id.as_str()).collect();
        // T-4 and T-2 tie on quality; T-4 is more recent.
        assert_eq!(ids, vec!["T-4", "T-2", "T-1"]);
    }

    #[tokio::test]
    async fn test_store_assigns_sequence() {
        let bank = InMemoryBank::default();
        bank.store(record("T-1", "C", TicketCategory::General, 3.0)).await.unwrap();
        bank.store(record("T-2", "C", TicketCategory::General, 3.0)).await.unwrap();
        assert_eq!(bank.get_record("T-1").await.unwrap().sequence, 0);
        assert_eq!(bank.get_record("T-2").await.unwrap().sequence, 1);
        assert!(bank.get_record("T-3").await.is_none());
    }
}
