//! Types for the ticket orchestrator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::PipelineStage;
use crate::stages::{AgentKind, SpecialistKind};
use crate::ticket::{Ticket, TicketCategory, TicketStatus, ValidationError};

/// Errors returned to `process_ticket` and `resume_ticket` callers.
///
/// Anything that goes wrong once a ticket is inside the stage sequence is
/// reported as an escalated [`ProcessResult`] instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The ticket cannot enter the pipeline.
    #[error("invalid ticket: {0}")]
    Validation(#[from] ValidationError),

    /// The session was paused; the run stopped at a stage boundary.
    #[error("session {session_id} for ticket {ticket_id} paused after {stage}")]
    Paused {
        ticket_id: String,
        session_id: String,
        stage: PipelineStage,
    },

    /// No active session with this id.
    #[error("unknown session: {0}")]
    UnknownSession(String),

    /// Resume was requested for a session that is not paused.
    #[error("session {0} is not paused")]
    NotPaused(String),

    /// Checkpoint data is missing or unreadable.
    #[error("corrupt checkpoint for session {session_id}: {reason}")]
    CorruptCheckpoint { session_id: String, reason: String },
}

/// Final outcome of a ticket run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessResult {
    pub ticket_id: String,
    pub session_id: String,
    pub status: TicketStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<TicketCategory>,
    pub priority: u8,
    /// Present whenever the resolution stage scored the ticket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f32>,
    /// Wall time spent in the pipeline, across resumes.
    pub processing_time_ms: f64,
    pub resolution_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialist: Option<SpecialistKind>,
    /// Agents that ran, in order.
    pub agents_invoked: Vec<AgentKind>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ProcessResult {
    /// Result for a finished ticket.
    pub(crate) fn from_ticket(
        ticket: &Ticket,
        session_id: &str,
        processing_time_ms: f64,
        resolution_text: String,
        quality_score: Option<f32>,
        specialist: Option<SpecialistKind>,
        agents_invoked: Vec<AgentKind>,
    ) -> Self {
        Self {
            ticket_id: ticket.id.clone(),
            session_id: session_id.to_string(),
            status: ticket.status,
            category: ticket.category,
            priority: ticket.priority,
            quality_score,
            processing_time_ms,
            resolution_text,
            specialist,
            agents_invoked,
            metadata: ticket.metadata.clone(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == TicketStatus::Resolved
    }

    pub fn is_escalated(&self) -> bool {
        self.status == TicketStatus::Escalated
    }

    pub fn escalation_reason(&self) -> Option<&str> {
        self.metadata.get("escalation_reason").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_from_ticket() {
        let mut ticket = Ticket::with_id("T-1", "C", "s", "d");
        ticket.category = Some(TicketCategory::Billing);
        ticket.transition_to(TicketStatus::Escalated).unwrap();
        ticket.set_metadata("escalation_reason", "specialist timed out");

        let result = ProcessResult::from_ticket(
            &ticket,
            "sess-1",
            12.5,
            String::new(),
            None,
            Some(SpecialistKind::Billing),
            vec![AgentKind::Intake, AgentKind::Triage],
        );
        assert!(result.is_escalated());
        assert!(!result.is_resolved());
        assert_eq!(result.escalation_reason(), Some("specialist timed out"));
        assert_eq!(result.category, Some(TicketCategory::Billing));
    }

    #[test]
    fn test_result_serialization() {
        let ticket = Ticket::with_id("T-1", "C", "s", "d");
        let result = ProcessResult::from_ticket(&ticket, "sess-1", 1.0, "text".into(), Some(4.5), None, vec![]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "new");
        assert_eq!(json["quality_score"], 4.5);
        assert!(json.get("specialist").is_none());

        let parsed: ProcessResult = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_error_display() {
        let err = PipelineError::Paused {
            ticket_id: "T-1".to_string(),
            session_id: "sess-abc".to_string(),
            stage: PipelineStage::Triage,
        };
        assert_eq!(err.to_string(), "session sess-abc for ticket T-1 paused after triage");

        let err = PipelineError::Validation(ValidationError::MissingField("description"));
        assert_eq!(err.to_string(), "invalid ticket: missing required field: description");
    }
}
