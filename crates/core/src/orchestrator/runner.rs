//! Ticket orchestrator implementation.
//!
//! Drives a ticket through intake, triage, specialist and resolution:
//! - Each stage completes before the next starts
//! - The session is checkpointed after every stage
//! - The pause flag is checked at every stage boundary
//! - Failures inside the sequence escalate the ticket

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigError};
use crate::generator::{build_generator, ResponseGenerator};
use crate::memory::{CustomerContext, InMemoryBank, MemoryBank, MemoryConfig, MemoryRecord};
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::session::{session_id_for, CheckpointData, PipelineStage, SessionError, SessionState, SessionTracker};
use crate::stages::{
    AgentKind, IntakeOutput, IntakeStage, ResolutionOutput, ResolutionStage, RuleTable,
    SpecialistOutput, SpecialistStage, StageError, TriageOutput, TriageStage,
};
use crate::ticket::{Ticket, TicketCategory, TicketStatus};
use crate::tools::{CustomerDirectory, KnowledgeBase, StaticCrm, StaticKnowledgeBase};

use super::config::OrchestratorConfig;
use super::types::{PipelineError, ProcessResult};

const KEY_TICKET: &str = "ticket";
const KEY_AGENTS: &str = "agents";
const KEY_ELAPSED: &str = "elapsed_ms";

/// Everything a run has produced so far. Rebuilt from the checkpoint on resume.
struct RunState {
    session_id: String,
    ticket: Ticket,
    /// Time spent in earlier runs of this session.
    prior_ms: f64,
    agents: Vec<AgentKind>,
    intake: Option<IntakeOutput>,
    triage: Option<TriageOutput>,
    specialist: Option<SpecialistOutput>,
    resolution: Option<ResolutionOutput>,
}

impl RunState {
    fn new(session_id: String, ticket: Ticket) -> Self {
        Self {
            session_id,
            ticket,
            prior_ms: 0.0,
            agents: Vec::new(),
            intake: None,
            triage: None,
            specialist: None,
            resolution: None,
        }
    }

    fn from_checkpoint(state: &SessionState) -> Result<Self, PipelineError> {
        let data = &state.checkpoint_data;
        let corrupt = |reason: String| PipelineError::CorruptCheckpoint {
            session_id: state.session_id.clone(),
            reason,
        };

        let ticket: Ticket = read_key(data, KEY_TICKET)
            .map_err(&corrupt)?
            .ok_or_else(|| corrupt("no ticket snapshot".to_string()))?;
        let mut run = Self::new(state.session_id.clone(), ticket);
        run.prior_ms = data.get(KEY_ELAPSED).and_then(Value::as_f64).unwrap_or(0.0);
        run.agents = read_key(data, KEY_AGENTS).map_err(&corrupt)?.unwrap_or_default();
        run.intake = read_key(data, PipelineStage::Intake.as_str()).map_err(&corrupt)?;
        run.triage = read_key(data, PipelineStage::Triage.as_str()).map_err(&corrupt)?;
        run.specialist = read_key(data, PipelineStage::Specialist.as_str()).map_err(&corrupt)?;
        run.resolution = read_key(data, PipelineStage::Resolution.as_str()).map_err(&corrupt)?;

        let complete = [
            (PipelineStage::Intake, run.intake.is_some()),
            (PipelineStage::Triage, run.triage.is_some()),
            (PipelineStage::Specialist, run.specialist.is_some()),
            (PipelineStage::Resolution, run.resolution.is_some()),
        ];
        for (stage, present) in complete {
            if stage <= state.current_stage && !present {
                return Err(corrupt(format!("missing {} output", stage)));
            }
        }
        Ok(run)
    }

    fn context(&self) -> CustomerContext {
        self.intake
            .as_ref()
            .map(|i| i.context.clone())
            .unwrap_or_else(|| CustomerContext::empty(self.ticket.customer_id.clone()))
    }

    fn checkpoint(&self, stage: PipelineStage, elapsed_ms: f64) -> Result<CheckpointData, StageError> {
        let mut data = CheckpointData::new();
        data.insert(KEY_TICKET.to_string(), serde_json::to_value(&self.ticket)?);
        data.insert(KEY_AGENTS.to_string(), serde_json::to_value(&self.agents)?);
        data.insert(KEY_ELAPSED.to_string(), Value::from(elapsed_ms));
        let output = match stage {
            PipelineStage::Received => None,
            PipelineStage::Intake => self.intake.as_ref().map(serde_json::to_value).transpose()?,
            PipelineStage::Triage => self.triage.as_ref().map(serde_json::to_value).transpose()?,
            PipelineStage::Specialist => {
                self.specialist.as_ref().map(serde_json::to_value).transpose()?
            }
            PipelineStage::Resolution => {
                self.resolution.as_ref().map(serde_json::to_value).transpose()?
            }
        };
        if let Some(output) = output {
            data.insert(stage.as_str().to_string(), output);
        }
        Ok(data)
    }
}

fn read_key<T: DeserializeOwned>(data: &CheckpointData, key: &str) -> Result<Option<T>, String> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| format!("{}: {}", key, e)),
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

/// The ticket orchestrator - drives tickets through the processing pipeline.
pub struct TicketOrchestrator {
    config: OrchestratorConfig,
    intake: IntakeStage,
    triage: TriageStage,
    specialist: SpecialistStage,
    resolution: ResolutionStage,
    memory: Arc<dyn MemoryBank>,
    sessions: Arc<SessionTracker>,
    metrics: Arc<MetricsCollector>,
}

impl TicketOrchestrator {
    /// Create a new orchestrator over injected stores and tools.
    pub fn new(
        config: OrchestratorConfig,
        rules: RuleTable,
        knowledge_base: Arc<dyn KnowledgeBase>,
        crm: Arc<dyn CustomerDirectory>,
        memory: Arc<dyn MemoryBank>,
        memory_config: MemoryConfig,
    ) -> Self {
        Self {
            config,
            intake: IntakeStage::new(rules, crm, memory.clone()),
            triage: TriageStage,
            specialist: SpecialistStage::new(knowledge_base, memory.clone(), memory_config),
            resolution: ResolutionStage::new(memory.clone()),
            memory,
            sessions: Arc::new(SessionTracker::new()),
            metrics: Arc::new(MetricsCollector::new()),
        }
    }

    /// Build an orchestrator with the static tools and in-memory stores from config.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let rules = RuleTable::from_config(&config.intake).map_err(ConfigError::ValidationError)?;
        let knowledge_base = StaticKnowledgeBase::from_config(&config.knowledge_base)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        let crm = StaticCrm::from_config(&config.crm);
        let memory = InMemoryBank::new(config.memory.clone());

        let mut orchestrator = Self::new(
            config.orchestrator.clone(),
            rules,
            Arc::new(knowledge_base),
            Arc::new(crm),
            Arc::new(memory),
            config.memory.clone(),
        );

        if let Some(generator_config) = &config.generator {
            let generator = build_generator(generator_config)
                .map_err(|e| ConfigError::ValidationError(format!("generator: {}", e)))?;
            orchestrator = orchestrator.with_generator(
                generator,
                generator_config.max_tokens,
                generator_config.temperature,
            );
        }
        Ok(orchestrator)
    }

    /// Let specialists use a generator, with templates as fallback.
    pub fn with_generator(
        mut self,
        generator: Arc<dyn ResponseGenerator>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        self.specialist = self.specialist.with_generator(generator, max_tokens, temperature);
        self
    }

    /// Share a session tracker with other components.
    pub fn with_sessions(mut self, sessions: Arc<SessionTracker>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Share a metrics collector with other components.
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn memory(&self) -> &Arc<dyn MemoryBank> {
        &self.memory
    }

    pub fn sessions(&self) -> &Arc<SessionTracker> {
        &self.sessions
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    pub async fn get_metrics(&self) -> MetricsSnapshot {
        self.metrics.get_metrics().await
    }

    /// Run a new ticket through the pipeline.
    ///
    /// Only validation failures and pauses are returned as errors. Every other
    /// failure produces an escalated result.
    pub async fn process_ticket(&self, ticket: Ticket) -> Result<ProcessResult, PipelineError> {
        ticket.validate()?;
        let started = Instant::now();
        info!("Processing ticket {} for customer {}", ticket.id, ticket.customer_id);

        let session_id = match self.sessions.create_session(&ticket.id).await {
            Ok(id) => id,
            Err(e) => {
                // The active session belongs to another run; leave it alone.
                let run = RunState::new(session_id_for(&ticket.id), ticket);
                return Ok(self.escalate(run, PipelineStage::Received, &StageError::from(e), started, false).await);
            }
        };

        let run = RunState::new(session_id, ticket);
        let initial = match run.checkpoint(PipelineStage::Received, 0.0) {
            Ok(checkpoint) => checkpoint,
            Err(e) => return Ok(self.escalate(run, PipelineStage::Received, &e, started, true).await),
        };
        if let Err(e) = self
            .sessions
            .update_state(&run.session_id, PipelineStage::Received, initial)
            .await
        {
            return Ok(self
                .escalate(run, PipelineStage::Received, &StageError::from(e), started, true)
                .await);
        }

        self.drive(run, PipelineStage::Received, started).await
    }

    /// Pause a session. The current run stops at the next stage boundary.
    pub async fn pause_session(&self, session_id: &str) -> Result<(), PipelineError> {
        self.sessions
            .pause(session_id)
            .await
            .map_err(|_| PipelineError::UnknownSession(session_id.to_string()))
    }

    /// Continue a paused session from its last completed stage.
    pub async fn resume_ticket(&self, session_id: &str) -> Result<ProcessResult, PipelineError> {
        let state = self
            .sessions
            .get_state(session_id)
            .await
            .map_err(|_| PipelineError::UnknownSession(session_id.to_string()))?;
        if !state.paused {
            return Err(PipelineError::NotPaused(session_id.to_string()));
        }

        let run = RunState::from_checkpoint(&state)?;
        self.sessions
            .resume(session_id)
            .await
            .map_err(|_| PipelineError::UnknownSession(session_id.to_string()))?;

        info!(
            "Resuming ticket {} after {}",
            state.ticket_id, state.current_stage
        );
        self.drive(run, state.current_stage, Instant::now()).await
    }

    /// Process tickets concurrently. Results are in input order.
    pub async fn process_batch(
        &self,
        tickets: Vec<Ticket>,
    ) -> Vec<Result<ProcessResult, PipelineError>> {
        let concurrency = self.config.batch_concurrency.max(1);
        stream::iter(tickets)
            .map(|ticket| self.process_ticket(ticket))
            .buffered(concurrency)
            .collect()
            .await
    }

    async fn drive(
        &self,
        mut run: RunState,
        from: PipelineStage,
        started: Instant,
    ) -> Result<ProcessResult, PipelineError> {
        let mut completed = from;
        while let Some(stage) = completed.next() {
            match self.sessions.is_paused(&run.session_id).await {
                Ok(false) => {}
                Ok(true) => {
                    info!(
                        "Ticket {} paused after {}",
                        run.ticket.id, completed
                    );
                    return Err(PipelineError::Paused {
                        ticket_id: run.ticket.id.clone(),
                        session_id: run.session_id.clone(),
                        stage: completed,
                    });
                }
                Err(e) => return Ok(self.escalate(run, stage, &StageError::from(e), started, true).await),
            }

            let stage_started = Instant::now();
            let outcome = self.run_stage(stage, &mut run).await;
            self.metrics.record_stage(stage, stage_started.elapsed()).await;
            if let Err(e) = outcome {
                return Ok(self.escalate(run, stage, &e, started, true).await);
            }

            let checkpoint = match run.checkpoint(stage, run.prior_ms + elapsed_ms(started)) {
                Ok(checkpoint) => checkpoint,
                Err(e) => return Ok(self.escalate(run, stage, &e, started, true).await),
            };
            if let Err(e) = self
                .sessions
                .update_state(&run.session_id, stage, checkpoint)
                .await
            {
                return Ok(self.escalate(run, stage, &StageError::from(e), started, true).await);
            }
            debug!(ticket_id = %run.ticket.id, stage = %stage, "Stage complete");
            completed = stage;
        }

        Ok(self.finish(run, started).await)
    }

    async fn run_stage(&self, stage: PipelineStage, run: &mut RunState) -> Result<(), StageError> {
        match stage {
            PipelineStage::Received => {}
            PipelineStage::Intake => {
                run.agents.push(AgentKind::Intake);
                let (ticket, output) = self.intake.run(run.ticket.clone()).await?;
                run.ticket = ticket;
                run.intake = Some(output);
            }
            PipelineStage::Triage => {
                run.agents.push(AgentKind::Triage);
                let (ticket, output) = self.triage.run(run.ticket.clone())?;
                run.ticket = ticket;
                run.triage = Some(output);
            }
            PipelineStage::Specialist => {
                let kind = run
                    .triage
                    .map(|t| t.specialist)
                    .ok_or_else(|| StageError::NoRouteFound {
                        ticket_id: run.ticket.id.clone(),
                    })?;
                run.agents.push(kind.agent());

                let context = run.context();
                let limit = Duration::from_millis(self.config.specialist_timeout_ms);
                let call = self.specialist.run(kind, run.ticket.clone(), &context);
                let (ticket, output) = match tokio::time::timeout(limit, call).await {
                    Ok(result) => result?,
                    Err(_) => {
                        return Err(StageError::Timeout {
                            stage: format!("{} specialist", kind),
                            after: limit,
                        })
                    }
                };
                run.ticket = ticket;
                run.specialist = Some(output);
            }
            PipelineStage::Resolution => {
                let specialist = run.specialist.clone().ok_or_else(|| StageError::NoRouteFound {
                    ticket_id: run.ticket.id.clone(),
                })?;
                run.agents.push(AgentKind::Resolution);

                let context = run.context();
                let (ticket, output) = self
                    .resolution
                    .run(run.ticket.clone(), &context, &specialist)
                    .await?;
                run.ticket = ticket;
                run.resolution = Some(output);
            }
        }
        Ok(())
    }

    async fn finish(&self, run: RunState, started: Instant) -> ProcessResult {
        let processing_time_ms = run.prior_ms + elapsed_ms(started);
        let specialist = run.triage.map(|t| t.specialist);
        let (text, quality) = match run.resolution {
            Some(resolution) => (resolution.resolution_text, Some(resolution.quality_score)),
            None => (String::new(), None),
        };

        let result = ProcessResult::from_ticket(
            &run.ticket,
            &run.session_id,
            processing_time_ms,
            text,
            quality,
            specialist,
            run.agents,
        );

        self.archive(&run.session_id).await;
        self.metrics.record_ticket_processed(&result).await;
        info!(
            "Ticket {} {} in {:.1}ms",
            result.ticket_id, result.status, processing_time_ms
        );
        result
    }

    /// Turn a failure into an escalated result.
    ///
    /// A run whose resolution stage already completed keeps its resolution;
    /// its memory record and score are already final.
    async fn escalate(
        &self,
        mut run: RunState,
        stage: PipelineStage,
        error: &StageError,
        started: Instant,
        owns_session: bool,
    ) -> ProcessResult {
        if run.resolution.is_some() {
            warn!(
                "Ticket {} finished but {} bookkeeping failed: {}",
                run.ticket.id, stage, error
            );
            run.ticket.set_metadata("checkpoint_error", error.to_string());
            return self.finish(run, started).await;
        }

        warn!(
            "Escalating ticket {} after failure in {}: {}",
            run.ticket.id, stage, error
        );

        let mut ticket = run.ticket;
        ticket.set_metadata("escalation_reason", error.to_string());
        ticket.set_metadata("failed_stage", stage.as_str());
        if !ticket.is_terminal() {
            if let Err(e) = ticket.transition_to(TicketStatus::Escalated) {
                warn!("Could not escalate ticket {}: {}", ticket.id, e);
            }
        }

        let text = match run.specialist {
            Some(output) => output.response_text,
            None => format!(
                "Your request has been escalated to a support specialist who will follow up shortly.\n\nTicket reference: {}",
                ticket.id
            ),
        };

        if owns_session {
            let category = ticket.category.unwrap_or(TicketCategory::General);
            let record = MemoryRecord::new(
                ticket.id.clone(),
                ticket.customer_id.clone(),
                category,
                text.clone(),
                0.0,
            );
            if let Err(e) = self.memory.store(record).await {
                warn!("Could not record escalation for ticket {}: {}", ticket.id, e);
            }
            self.archive(&run.session_id).await;
        }

        let result = ProcessResult::from_ticket(
            &ticket,
            &run.session_id,
            run.prior_ms + elapsed_ms(started),
            text,
            None,
            run.triage.map(|t| t.specialist),
            run.agents,
        );
        self.metrics.record_ticket_processed(&result).await;
        result
    }

    async fn archive(&self, session_id: &str) {
        if let Err(e) = self.sessions.archive(session_id).await {
            match e {
                SessionError::UnknownSession(_) => {
                    debug!(session_id, "Session already archived")
                }
                other => warn!(session_id, error = %other, "Failed to archive session"),
            }
        }
    }
}
