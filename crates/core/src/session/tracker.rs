//! In-memory session tracker.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::session::types::{
    session_id_for, CheckpointData, PipelineStage, SessionError, SessionState, StageTransition,
};

/// Tracks per-ticket workflow state across stage transitions.
///
/// Sessions move to the archive when their ticket reaches a terminal status,
/// which allows the same ticket id to be processed again later.
#[derive(Default)]
pub struct SessionTracker {
    active: RwLock<HashMap<String, SessionState>>,
    archived: RwLock<Vec<SessionState>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for a ticket. Fails if one is already active.
    pub async fn create_session(&self, ticket_id: &str) -> Result<String, SessionError> {
        let session_id = session_id_for(ticket_id);
        let mut active = self.active.write().await;
        if active.contains_key(&session_id) {
            return Err(SessionError::DuplicateSession {
                ticket_id: ticket_id.to_string(),
                session_id,
            });
        }
        active.insert(session_id.clone(), SessionState::new(ticket_id));
        tracing::debug!(ticket_id, session_id = %session_id, "Session created");
        Ok(session_id)
    }

    /// Record a completed stage and merge its checkpoint data.
    pub async fn update_state(
        &self,
        session_id: &str,
        stage: PipelineStage,
        checkpoint: CheckpointData,
    ) -> Result<(), SessionError> {
        let mut active = self.active.write().await;
        let state = active
            .get_mut(session_id)
            .ok_or_else(|| SessionError::UnknownSession(session_id.to_string()))?;

        let now = Utc::now();
        state.current_stage = stage;
        state.checkpoint_data.extend(checkpoint);
        state.history.push(StageTransition { stage, at: now });
        state.updated_at = now;
        Ok(())
    }

    pub async fn pause(&self, session_id: &str) -> Result<(), SessionError> {
        self.set_paused(session_id, true).await
    }

    pub async fn resume(&self, session_id: &str) -> Result<(), SessionError> {
        self.set_paused(session_id, false).await
    }

    async fn set_paused(&self, session_id: &str, paused: bool) -> Result<(), SessionError> {
        let mut active = self.active.write().await;
        let state = active
            .get_mut(session_id)
            .ok_or_else(|| SessionError::UnknownSession(session_id.to_string()))?;
        state.paused = paused;
        state.updated_at = Utc::now();
        tracing::info!(session_id, paused, "Session pause flag changed");
        Ok(())
    }

    pub async fn is_paused(&self, session_id: &str) -> Result<bool, SessionError> {
        self.active
            .read()
            .await
            .get(session_id)
            .map(|s| s.paused)
            .ok_or_else(|| SessionError::UnknownSession(session_id.to_string()))
    }

    /// Snapshot of an active session.
    pub async fn get_state(&self, session_id: &str) -> Result<SessionState, SessionError> {
        self.active
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownSession(session_id.to_string()))
    }

    /// Move a finished session out of the active set.
    pub async fn archive(&self, session_id: &str) -> Result<SessionState, SessionError> {
        let state = self
            .active
            .write()
            .await
            .remove(session_id)
            .ok_or_else(|| SessionError::UnknownSession(session_id.to_string()))?;
        self.archived.write().await.push(state.clone());
        Ok(state)
    }

    /// Most recently archived session for a ticket.
    pub async fn archived_for_ticket(&self, ticket_id: &str) -> Option<SessionState> {
        self.archived
            .read()
            .await
            .iter()
            .rev()
            .find(|s| s.ticket_id == ticket_id)
            .cloned()
    }

    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }

    pub async fn archived_count(&self) -> usize {
        self.archived.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn checkpoint(key: &str, value: serde_json::Value) -> CheckpointData {
        let mut data = CheckpointData::new();
        data.insert(key.to_string(), value);
        data
    }

    #[tokio::test]
    async fn test_create_session() {
        let tracker = SessionTracker::new();
        let id = tracker.create_session("TKT-1").await.unwrap();
        assert_eq!(id, session_id_for("TKT-1"));
        assert_eq!(tracker.active_count().await, 1);

        let state = tracker.get_state(&id).await.unwrap();
        assert_eq!(state.ticket_id, "TKT-1");
        assert_eq!(state.current_stage, PipelineStage::Received);
    }

    #[tokio::test]
    async fn test_duplicate_session_rejected() {
        let tracker = SessionTracker::new();
        tracker.create_session("TKT-1").await.unwrap();
        let err = tracker.create_session("TKT-1").await.unwrap_err();
        assert!(matches!(err, SessionError::DuplicateSession { .. }));
    }

    #[tokio::test]
    async fn test_archive_allows_new_session() {
        let tracker = SessionTracker::new();
        let id = tracker.create_session("TKT-1").await.unwrap();
        tracker.archive(&id).await.unwrap();
        assert_eq!(tracker.active_count().await, 0);
        assert_eq!(tracker.archived_count().await, 1);
        assert!(tracker.archived_for_ticket("TKT-1").await.is_some());

        assert!(tracker.create_session("TKT-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_state_merges_checkpoint() {
        let tracker = SessionTracker::new();
        let id = tracker.create_session("TKT-1").await.unwrap();

        tracker
            .update_state(&id, PipelineStage::Received, checkpoint("ticket", json!({"id": "TKT-1"})))
            .await
            .unwrap();
        tracker
            .update_state(&id, PipelineStage::Intake, checkpoint("intake", json!({"category": "billing"})))
            .await
            .unwrap();
        tracker
            .update_state(&id, PipelineStage::Triage, checkpoint("triage", json!("billing")))
            .await
            .unwrap();

        let state = tracker.get_state(&id).await.unwrap();
        assert_eq!(state.current_stage, PipelineStage::Triage);
        assert!(state.checkpoint_data.contains_key("ticket"));
        assert!(state.checkpoint_data.contains_key("intake"));
        assert!(state.checkpoint_data.contains_key("triage"));
        let stages: Vec<PipelineStage> = state.history.iter().map(|t| t.stage).collect();
        assert_eq!(
            stages,
            vec![PipelineStage::Received, PipelineStage::Intake, PipelineStage::Triage]
        );
    }

    #[tokio::test]
    async fn test_update_unknown_session() {
        let tracker = SessionTracker::new();
        let err = tracker
            .update_state("sess-missing", PipelineStage::Intake, CheckpointData::new())
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::UnknownSession("sess-missing".to_string()));
    }

    #[tokio::test]
    async fn test_pause_resume_keeps_checkpoint() {
        let tracker = SessionTracker::new();
        let id = tracker.create_session("TKT-1").await.unwrap();
        tracker
            .update_state(&id, PipelineStage::Intake, checkpoint("intake", json!(1)))
            .await
            .unwrap();

        tracker.pause(&id).await.unwrap();
        assert!(tracker.is_paused(&id).await.unwrap());

        tracker.resume(&id).await.unwrap();
        let state = tracker.get_state(&id).await.unwrap();
        assert!(!state.paused);
        assert_eq!(state.current_stage, PipelineStage::Intake);
        assert_eq!(state.checkpoint_data["intake"], json!(1));
    }

    #[tokio::test]
    async fn test_pause_unknown_session() {
        let tracker = SessionTracker::new();
        assert!(tracker.pause("nope").await.is_err());
        assert!(tracker.resume("nope").await.is_err());
    }
}
