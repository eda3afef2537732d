//! Per-ticket session tracking: current stage, checkpoints, pause/resume.

mod tracker;
mod types;

pub use tracker::SessionTracker;
pub use types::{
    session_id_for, CheckpointData, PipelineStage, SessionError, SessionState, StageTransition,
};
