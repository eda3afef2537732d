//! Intake: classify, enrich and start work on a ticket.

use std::sync::Arc;

use serde_json::json;

use crate::memory::MemoryBank;
use crate::stages::rules::RuleTable;
use crate::stages::types::{IntakeOutput, StageError};
use crate::ticket::{Ticket, TicketStatus};
use crate::tools::CustomerDirectory;

/// Intake stage.
pub struct IntakeStage {
    rules: RuleTable,
    crm: Arc<dyn CustomerDirectory>,
    memory: Arc<dyn MemoryBank>,
}

impl IntakeStage {
    pub fn new(rules: RuleTable, crm: Arc<dyn CustomerDirectory>, memory: Arc<dyn MemoryBank>) -> Self {
        Self { rules, crm, memory }
    }

    /// Classify the ticket, attach customer data and move it to `InProgress`.
    pub async fn run(&self, mut ticket: Ticket) -> Result<(Ticket, IntakeOutput), StageError> {
        let classification = self.rules.classify(&ticket.text());

        let profile = self.crm.lookup(&ticket.customer_id).await;
        let context = self
            .memory
            .get_customer_context(&ticket.customer_id)
            .await
            .with_profile(&profile);
        let prior_tickets = context.total_tickets();

        ticket.category = Some(classification.category);
        ticket.topic = Some(classification.topic);
        ticket.priority = classification.priority;
        ticket.set_metadata("customer_tier", profile.tier.as_str());
        ticket.set_metadata("prior_tickets", prior_tickets);
        ticket.set_metadata("matched_rules", json!(classification.matched_rules));
        if let Some(name) = profile.display_name() {
            ticket.set_metadata("customer_name", name);
        }
        if !profile.known {
            ticket.set_metadata("unknown_customer", true);
        }
        ticket.transition_to(TicketStatus::InProgress)?;

        tracing::debug!(
            ticket_id = %ticket.id,
            category = %classification.category,
            priority = classification.priority,
            rules = ?classification.matched_rules,
            "Intake classified ticket"
        );

        let output = IntakeOutput {
            category: classification.category,
            topic: classification.topic,
            priority: classification.priority,
            matched_rules: classification.matched_rules,
            customer_tier: profile.tier,
            prior_tickets,
            context,
        };
        Ok((ticket, output))
    }
}
