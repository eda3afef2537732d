//! Metrics collector.

use std::collections::BTreeMap;
use std::time::Duration;

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use tokio::sync::RwLock;

use crate::metrics::types::{MetricsSnapshot, StageTiming};
use crate::orchestrator::ProcessResult;
use crate::session::PipelineStage;
use crate::stages::AgentKind;
use crate::ticket::{TicketCategory, TicketStatus};

#[derive(Debug, Default)]
struct Samples {
    processed: u64,
    resolved: u64,
    escalated: u64,
    categories: BTreeMap<TicketCategory, u64>,
    agents: BTreeMap<AgentKind, u64>,
    processing_ms: Vec<f64>,
    quality: Vec<f32>,
    stages: BTreeMap<PipelineStage, StageTiming>,
}

/// Prometheus instruments, registered on the collector's own registry.
struct Instruments {
    registry: Registry,
    processed: IntCounter,
    resolved: IntCounter,
    escalated: IntCounter,
    categories: IntCounterVec,
    agents: IntCounterVec,
    processing_seconds: Histogram,
    quality: Histogram,
    stage_seconds: HistogramVec,
}

impl Instruments {
    fn new() -> Self {
        let registry = Registry::new();

        let processed =
            IntCounter::new("triage_tickets_processed_total", "Total tickets processed")
                .expect("valid metric");
        let resolved =
            IntCounter::new("triage_tickets_resolved_total", "Total tickets resolved")
                .expect("valid metric");
        let escalated =
            IntCounter::new("triage_tickets_escalated_total", "Total tickets escalated")
                .expect("valid metric");
        let categories = IntCounterVec::new(
            Opts::new("triage_tickets_by_category_total", "Processed tickets by category"),
            &["category"],
        )
        .expect("valid metric");
        let agents = IntCounterVec::new(
            Opts::new("triage_agent_invocations_total", "Agent invocations"),
            &["agent"],
        )
        .expect("valid metric");
        let processing_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "triage_processing_duration_seconds",
                "End-to-end ticket processing time",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]),
        )
        .expect("valid metric");
        let quality = Histogram::with_opts(
            HistogramOpts::new("triage_quality_score", "Resolution quality scores")
                .buckets(vec![1.0, 2.0, 3.0, 3.5, 4.0, 4.5, 5.0]),
        )
        .expect("valid metric");
        let stage_seconds = HistogramVec::new(
            HistogramOpts::new("triage_stage_duration_seconds", "Duration of pipeline stages")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["stage"],
        )
        .expect("valid metric");

        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(processed.clone()),
            Box::new(resolved.clone()),
            Box::new(escalated.clone()),
            Box::new(categories.clone()),
            Box::new(agents.clone()),
            Box::new(processing_seconds.clone()),
            Box::new(quality.clone()),
            Box::new(stage_seconds.clone()),
        ];
        for collector in collectors {
            registry.register(collector).expect("metric names are unique");
        }

        Self {
            registry,
            processed,
            resolved,
            escalated,
            categories,
            agents,
            processing_seconds,
            quality,
            stage_seconds,
        }
    }
}

/// Observes every ticket run and stage transition.
pub struct MetricsCollector {
    samples: RwLock<Samples>,
    instruments: Instruments,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            samples: RwLock::new(Samples::default()),
            instruments: Instruments::new(),
        }
    }

    /// Record the final result of a ticket run.
    pub async fn record_ticket_processed(&self, result: &ProcessResult) {
        let mut samples = self.samples.write().await;
        samples.processed += 1;
        self.instruments.processed.inc();

        match result.status {
            TicketStatus::Resolved => {
                samples.resolved += 1;
                self.instruments.resolved.inc();
            }
            TicketStatus::Escalated => {
                samples.escalated += 1;
                self.instruments.escalated.inc();
            }
            TicketStatus::New | TicketStatus::InProgress => {
                tracing::warn!(
                    ticket_id = %result.ticket_id,
                    status = %result.status,
                    "Recorded a ticket that did not reach a terminal status"
                );
            }
        }

        if let Some(category) = result.category {
            *samples.categories.entry(category).or_insert(0) += 1;
            self.instruments
                .categories
                .with_label_values(&[category.as_str()])
                .inc();
        }

        for agent in &result.agents_invoked {
            *samples.agents.entry(*agent).or_insert(0) += 1;
            self.instruments
                .agents
                .with_label_values(&[agent.as_str()])
                .inc();
        }

        samples.processing_ms.push(result.processing_time_ms);
        self.instruments
            .processing_seconds
            .observe(result.processing_time_ms / 1000.0);

        if let Some(score) = result.quality_score {
            samples.quality.push(score);
            self.instruments.quality.observe(f64::from(score));
        }
    }

    /// Record time spent in one stage.
    pub async fn record_stage(&self, stage: PipelineStage, duration: Duration) {
        let ms = duration.as_secs_f64() * 1000.0;
        let mut samples = self.samples.write().await;
        let timing = samples.stages.entry(stage).or_default();
        timing.count += 1;
        timing.total_ms += ms;
        self.instruments
            .stage_seconds
            .with_label_values(&[stage.as_str()])
            .observe(duration.as_secs_f64());
    }

    /// Current metrics. Never fails, including before any ticket is processed.
    pub async fn get_metrics(&self) -> MetricsSnapshot {
        let samples = self.samples.read().await;

        let total_processing_ms: f64 = samples.processing_ms.iter().sum();
        let quality_total: f64 = samples.quality.iter().map(|q| f64::from(*q)).sum();

        MetricsSnapshot {
            tickets_processed: samples.processed,
            tickets_resolved: samples.resolved,
            tickets_escalated: samples.escalated,
            resolution_rate: ratio(samples.resolved as f64, samples.processed as f64),
            category_distribution: samples.categories.clone(),
            agent_invocations: samples.agents.clone(),
            average_processing_ms: ratio(total_processing_ms, samples.processing_ms.len() as f64),
            total_processing_ms,
            average_quality: ratio(quality_total, samples.quality.len() as f64),
            stage_timings: samples.stages.clone(),
            processing_samples: samples.processing_ms.len(),
            quality_samples: samples.quality.len(),
        }
    }

    /// Render the collector's registry in Prometheus text format.
    pub fn encode_prometheus(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.instruments.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
