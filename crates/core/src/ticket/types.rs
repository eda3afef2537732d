//! Core ticket data types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default priority for tickets that carry no urgency signal.
pub const DEFAULT_PRIORITY: u8 = 3;

/// Highest priority (most urgent).
pub const HIGHEST_PRIORITY: u8 = 1;

/// Lowest priority.
pub const LOWEST_PRIORITY: u8 = 5;

// ============================================================================
// Errors
// ============================================================================

/// Error type for ticket state changes.
#[derive(Debug, Error, PartialEq)]
pub enum TicketError {
    /// A status change that would move backwards or leave a terminal state.
    #[error("invalid transition for ticket {ticket_id}: {from} -> {to}")]
    InvalidTransition {
        ticket_id: String,
        from: TicketStatus,
        to: TicketStatus,
    },
}

/// A ticket that cannot enter the pipeline.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("ticket {ticket_id} has already been processed (status {status})")]
    AlreadyProcessed {
        ticket_id: String,
        status: TicketStatus,
    },
}

// ============================================================================
// Category
// ============================================================================

/// Ticket category, assigned by the intake stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    Technical,
    Billing,
    General,
    /// Urgency overrides the topical category.
    Urgent,
}

impl TicketCategory {
    pub const ALL: [TicketCategory; 4] = [
        TicketCategory::Technical,
        TicketCategory::Billing,
        TicketCategory::General,
        TicketCategory::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketCategory::Technical => "technical",
            TicketCategory::Billing => "billing",
            TicketCategory::General => "general",
            TicketCategory::Urgent => "urgent",
        }
    }
}

impl fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Status
// ============================================================================

/// Ticket lifecycle status.
///
/// Transitions only move forward: `New -> InProgress -> Resolved | Escalated`.
/// `Resolved` and `Escalated` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    InProgress,
    Resolved,
    Escalated,
}

impl TicketStatus {
    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Escalated)
    }

    fn rank(&self) -> u8 {
        match self {
            TicketStatus::New => 0,
            TicketStatus::InProgress => 1,
            TicketStatus::Resolved | TicketStatus::Escalated => 2,
        }
    }

    /// Returns true if moving from `self` to `next` is a legal transition.
    ///
    /// Staying in a non-terminal state is allowed so stages can be re-entered.
    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next.rank() >= self.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Escalated => "escalated",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Ticket
// ============================================================================

/// A customer support request tracked through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    /// Unique identifier.
    pub id: String,

    /// Customer who opened the ticket.
    pub customer_id: String,

    pub subject: String,

    /// Free text body.
    pub description: String,

    /// Assigned by intake. `None` until intake runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<TicketCategory>,

    /// Underlying topical category. Equals `category` unless urgency overrode it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<TicketCategory>,

    pub status: TicketStatus,

    /// 1 = highest, 5 = lowest.
    pub priority: u8,

    /// Open-ended enrichment data (customer tier, matched rules, escalation reason...).
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Create a new ticket with a system-assigned id.
    pub fn new(
        customer_id: impl Into<String>,
        subject: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::with_id(
            format!("TKT-{}", Uuid::new_v4()),
            customer_id,
            subject,
            description,
        )
    }

    /// Create a new ticket with a caller-assigned id.
    pub fn with_id(
        id: impl Into<String>,
        customer_id: impl Into<String>,
        subject: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            customer_id: customer_id.into(),
            subject: subject.into(),
            description: description.into(),
            category: None,
            topic: None,
            status: TicketStatus::New,
            priority: DEFAULT_PRIORITY,
            metadata: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check that the ticket can enter the pipeline.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingField("id"));
        }
        if self.customer_id.trim().is_empty() {
            return Err(ValidationError::MissingField("customer_id"));
        }
        if self.subject.trim().is_empty() {
            return Err(ValidationError::MissingField("subject"));
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::MissingField("description"));
        }
        if self.status != TicketStatus::New {
            return Err(ValidationError::AlreadyProcessed {
                ticket_id: self.id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    /// Move the ticket to a new status, enforcing forward-only transitions.
    pub fn transition_to(&mut self, next: TicketStatus) -> Result<(), TicketError> {
        if !self.status.can_transition_to(next) {
            return Err(TicketError::InvalidTransition {
                ticket_id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Insert or replace a metadata entry. Allowed in every status.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.into(), value.into());
        self.updated_at = Utc::now();
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    /// Subject and description joined, the text all keyword matching runs on.
    pub fn text(&self) -> String {
        format!("{} {}", self.subject, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ticket_defaults() {
        let ticket = Ticket::new("CUST-1", "Cannot login", "forgot password");
        assert!(ticket.id.starts_with("TKT-"));
        assert_eq!(ticket.status, TicketStatus::New);
        assert_eq!(ticket.priority, DEFAULT_PRIORITY);
        assert!(ticket.category.is_none());
        assert!(ticket.metadata.is_empty());
    }

    #[test]
    fn test_system_ids_are_unique() {
        let a = Ticket::new("c", "s", "d");
        let b = Ticket::new("c", "s", "d");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_validate_missing_fields() {
        let ticket = Ticket::with_id("T-1", "CUST-1", "Subject", "   ");
        assert_eq!(
            ticket.validate(),
            Err(ValidationError::MissingField("description"))
        );

        let ticket = Ticket::with_id("T-1", "", "Subject", "body");
        assert_eq!(
            ticket.validate(),
            Err(ValidationError::MissingField("customer_id"))
        );

        let ticket = Ticket::with_id("T-1", "CUST-1", "", "body");
        assert_eq!(ticket.validate(), Err(ValidationError::MissingField("subject")));
    }

    #[test]
    fn test_validate_rejects_processed_ticket() {
        let mut ticket = Ticket::with_id("T-1", "CUST-1", "Subject", "body");
        ticket.transition_to(TicketStatus::InProgress).unwrap();
        assert!(matches!(
            ticket.validate(),
            Err(ValidationError::AlreadyProcessed { .. })
        ));
    }

    #[test]
    fn test_forward_transitions() {
        let mut ticket = Ticket::new("c", "s", "d");
        assert!(ticket.transition_to(TicketStatus::InProgress).is_ok());
        assert!(ticket.transition_to(TicketStatus::InProgress).is_ok());
        assert!(ticket.transition_to(TicketStatus::Resolved).is_ok());
        assert!(ticket.is_terminal());
    }

    #[test]
    fn test_no_transition_out_of_terminal() {
        let mut ticket = Ticket::new("c", "s", "d");
        ticket.transition_to(TicketStatus::Escalated).unwrap();

        let err = ticket.transition_to(TicketStatus::Resolved).unwrap_err();
        assert_eq!(
            err,
            TicketError::InvalidTransition {
                ticket_id: ticket.id.clone(),
                from: TicketStatus::Escalated,
                to: TicketStatus::Resolved,
            }
        );
        assert!(ticket.transition_to(TicketStatus::Escalated).is_err());
    }

    #[test]
    fn test_no_backward_transition() {
        let mut ticket = Ticket::new("c", "s", "d");
        ticket.transition_to(TicketStatus::InProgress).unwrap();
        assert!(ticket.transition_to(TicketStatus::New).is_err());
        assert_eq!(ticket.status, TicketStatus::InProgress);
    }

    #[test]
    fn test_metadata_append_after_resolution() {
        let mut ticket = Ticket::new("c", "s", "d");
        ticket.transition_to(TicketStatus::Resolved).unwrap();
        ticket.set_metadata("feedback", "thanks");
        assert_eq!(ticket.metadata_str("feedback"), Some("thanks"));
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&TicketCategory::Urgent).unwrap();
        assert_eq!(json, "\"urgent\"");
        let status: TicketStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, TicketStatus::InProgress);
    }

    #[test]
    fn test_ticket_roundtrips_through_json() {
        let mut ticket = Ticket::with_id("T-9", "CUST-9", "Refund", "billing issue");
        ticket.category = Some(TicketCategory::Billing);
        ticket.set_metadata("tier", "premium");
        let json = serde_json::to_value(&ticket).unwrap();
        let parsed: Ticket = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, ticket);
    }
}
