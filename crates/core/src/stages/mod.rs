//! Pipeline stages: intake, triage, specialists and resolution.
//!
//! Every stage takes ownership of the ticket and hands back the updated
//! ticket with a serializable output. Stages have no side effects before they
//! complete, so any stage can be re-entered from a checkpoint.

mod intake;
mod resolution;
mod rules;
mod specialist;
mod triage;
mod types;

pub use intake::IntakeStage;
pub use resolution::{personalize, score_quality, Personalization, ResolutionStage, MAX_QUALITY};
pub use rules::{default_rules, Classification, IntakeConfig, IntakeRule, RuleEffect, RuleTable};
pub use specialist::{
    build_request, compose_handoff, compose_solution, SpecialistStage, ESCALATION_PRIORITY,
};
pub use triage::{route, TriageStage};
pub use types::{
    AgentKind, IntakeOutput, ResolutionOutput, SpecialistKind, SpecialistOutput, StageError,
    TriageOutput,
};
