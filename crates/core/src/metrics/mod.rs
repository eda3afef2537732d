//! Pipeline metrics: in-process aggregates plus Prometheus exposition.

mod collector;
mod types;

pub use collector::MetricsCollector;
pub use types::{MetricsSnapshot, StageTiming};
