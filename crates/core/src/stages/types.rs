//! Stage outputs, agent identifiers and stage errors.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::memory::{CustomerContext, MemoryError};
use crate::session::SessionError;
use crate::ticket::{TicketCategory, TicketError};
use crate::tools::{CustomerTier, ToolError};

/// Errors raised inside the stage sequence.
///
/// The orchestrator converts every one of these into an escalated result.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("no route for ticket {ticket_id}: category not set")]
    NoRouteFound { ticket_id: String },

    #[error("tool unavailable: {0}")]
    ToolUnavailable(#[from] ToolError),

    #[error("{stage} stage timed out after {after:?}")]
    Timeout { stage: String, after: Duration },

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("ticket error: {0}")]
    Ticket(#[from] TicketError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] serde_json::Error),
}

/// Every agent that can touch a ticket. Used for invocation accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Intake,
    Triage,
    Technical,
    Billing,
    General,
    Resolution,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Intake => "intake",
            AgentKind::Triage => "triage",
            AgentKind::Technical => "technical",
            AgentKind::Billing => "billing",
            AgentKind::General => "general",
            AgentKind::Resolution => "resolution",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain specialists a ticket can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialistKind {
    Technical,
    Billing,
    General,
}

impl SpecialistKind {
    /// Specialist handling a topical category. `Urgent` has no direct specialist.
    pub fn for_category(category: TicketCategory) -> Option<SpecialistKind> {
        match category {
            TicketCategory::Technical => Some(SpecialistKind::Technical),
            TicketCategory::Billing => Some(SpecialistKind::Billing),
            TicketCategory::General => Some(SpecialistKind::General),
            TicketCategory::Urgent => None,
        }
    }

    pub fn agent(&self) -> AgentKind {
        match self {
            SpecialistKind::Technical => AgentKind::Technical,
            SpecialistKind::Billing => AgentKind::Billing,
            SpecialistKind::General => AgentKind::General,
        }
    }

    pub fn category(&self) -> TicketCategory {
        match self {
            SpecialistKind::Technical => TicketCategory::Technical,
            SpecialistKind::Billing => TicketCategory::Billing,
            SpecialistKind::General => TicketCategory::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.agent().as_str()
    }

    /// Role description used in generator prompts.
    pub fn role(&self) -> &'static str {
        match self {
            SpecialistKind::Technical => {
                "Technical Support Specialist with expertise in software troubleshooting, account access issues and system debugging"
            }
            SpecialistKind::Billing => {
                "Billing Support Specialist with expertise in payment processing, refunds, disputes and account billing"
            }
            SpecialistKind::General => {
                "General Customer Support Specialist handling inquiries, information requests and general assistance"
            }
        }
    }
}

impl fmt::Display for SpecialistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the intake stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntakeOutput {
    pub category: TicketCategory,
    pub topic: TicketCategory,
    pub priority: u8,
    /// Names of the rules that fired, in table order.
    pub matched_rules: Vec<String>,
    pub customer_tier: CustomerTier,
    pub prior_tickets: usize,
    /// Customer history, carried forward to later stages.
    pub context: CustomerContext,
}

/// Output of the triage stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TriageOutput {
    pub specialist: SpecialistKind,
    pub priority_handling: bool,
}

/// Output of a specialist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecialistOutput {
    pub specialist: SpecialistKind,
    pub response_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kb_topic: Option<String>,
    /// Set when no verified remediation was found.
    pub needs_handoff: bool,
    /// Generator model, when the text came from a generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<String>,
    /// Past ticket whose resolution was referenced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_ticket: Option<String>,
}

/// Output of the resolution stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolutionOutput {
    pub quality_score: f32,
    pub resolution_text: String,
}
