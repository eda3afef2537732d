//! Session state types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Checkpoint payload captured at stage boundaries.
pub type CheckpointData = serde_json::Map<String, serde_json::Value>;

/// Errors from session tracker misuse.
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("session already active for ticket {ticket_id} ({session_id})")]
    DuplicateSession {
        ticket_id: String,
        session_id: String,
    },

    #[error("unknown session: {0}")]
    UnknownSession(String),
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Session created, no stage run yet.
    Received,
    Intake,
    Triage,
    Specialist,
    Resolution,
}

impl PipelineStage {
    /// The stage that runs after this one completes.
    pub fn next(&self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Received => Some(PipelineStage::Intake),
            PipelineStage::Intake => Some(PipelineStage::Triage),
            PipelineStage::Triage => Some(PipelineStage::Specialist),
            PipelineStage::Specialist => Some(PipelineStage::Resolution),
            PipelineStage::Resolution => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Received => "received",
            PipelineStage::Intake => "intake",
            PipelineStage::Triage => "triage",
            PipelineStage::Specialist => "specialist",
            PipelineStage::Resolution => "resolution",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded stage boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageTransition {
    pub stage: PipelineStage,
    pub at: DateTime<Utc>,
}

/// Per-ticket workflow state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    pub session_id: String,
    pub ticket_id: String,
    /// Last completed stage.
    pub current_stage: PipelineStage,
    pub checkpoint_data: CheckpointData,
    pub paused: bool,
    /// Every recorded stage boundary, oldest first.
    pub history: Vec<StageTransition>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(ticket_id: &str) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id_for(ticket_id),
            ticket_id: ticket_id.to_string(),
            current_stage: PipelineStage::Received,
            checkpoint_data: CheckpointData::new(),
            paused: false,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Stage to run when the session continues.
    pub fn next_stage(&self) -> Option<PipelineStage> {
        self.current_stage.next()
    }

    pub fn is_complete(&self) -> bool {
        self.current_stage == PipelineStage::Resolution
    }
}

/// Session id for a ticket: `sess-` plus the first 16 hex chars of SHA-256(ticket id).
pub fn session_id_for(ticket_id: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(ticket_id.as_bytes()));
    format!("sess-{}", &digest[..16])
}
