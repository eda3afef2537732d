mod tickets;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use triage_core::{
    load_config, validate_config, Config, LoggingConfig, MetricsSnapshot, ProcessResult,
    SanitizedConfig, TicketOrchestrator,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the config file.
const CONFIG_ENV: &str = "TRIAGE_CONFIG";

/// Run support tickets through the triage pipeline and print a JSON report.
#[derive(Debug, Parser)]
#[command(name = "triage", version)]
struct Args {
    /// JSON array of tickets. Runs a built-in demo set when omitted.
    tickets: Option<PathBuf>,

    /// Also print metrics in Prometheus text format.
    #[arg(long)]
    prometheus: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    results: &'a [ProcessResult],
    failures: &'a [String],
    metrics: &'a MetricsSnapshot,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);
    // Logs go to stderr so stdout carries only the report.
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn read_config() -> Result<(Config, Option<PathBuf>)> {
    let explicit = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
    let path = explicit.clone().unwrap_or_else(|| PathBuf::from("config.toml"));

    if explicit.is_none() && !path.exists() {
        return Ok((Config::default(), None));
    }
    let config = load_config(&path)
        .with_context(|| format!("Failed to load config from {:?}", path))?;
    Ok((config, Some(path)))
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let (config, config_path) = read_config()?;

    init_logging(&config.logging);
    info!("triage {} starting", VERSION);
    match &config_path {
        Some(path) => info!("Configuration loaded from {:?}", path),
        None => info!("No config file found, using defaults"),
    }

    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    let config_json = serde_json::to_string(&sanitized).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        config_hash = &config_hash[..16],
        intake_rules = sanitized.intake_rules,
        knowledge_base_topics = sanitized.knowledge_base_topics,
        crm_profiles = sanitized.crm_profiles,
        generator = sanitized.generator.is_some(),
        "Configuration validated"
    );

    let orchestrator =
        TicketOrchestrator::from_config(&config).context("Failed to build orchestrator")?;

    let tickets = match &args.tickets {
        Some(path) => tickets::load_tickets(path)?,
        None => {
            info!("No tickets file given, running the demo set");
            tickets::demo_tickets()
        }
    };
    info!("Processing {} tickets", tickets.len());

    let mut results = Vec::new();
    let mut failures = Vec::new();
    for outcome in orchestrator.process_batch(tickets).await {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!("Ticket rejected: {}", e);
                failures.push(e.to_string());
            }
        }
    }

    let metrics = orchestrator.get_metrics().await;
    info!(
        "Processed {} tickets: {} resolved, {} escalated ({:.1}% resolution rate)",
        metrics.tickets_processed,
        metrics.tickets_resolved,
        metrics.tickets_escalated,
        metrics.resolution_rate_percent()
    );

    let report = Report {
        results: &results,
        failures: &failures,
        metrics: &metrics,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
    );

    if args.prometheus {
        print!("{}", orchestrator.metrics().encode_prometheus());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_args() {
        let args = Args::try_parse_from(["triage"]).unwrap();
        assert!(args.tickets.is_none());
        assert!(!args.prometheus);
    }

    #[test]
    fn test_parse_tickets_and_flag() {
        let args = Args::try_parse_from(["triage", "tickets.json", "--prometheus"]).unwrap();
        assert_eq!(args.tickets, Some(PathBuf::from("tickets.json")));
        assert!(args.prometheus);
    }

    #[test]
    fn test_parse_rejects_unknown_flag() {
        assert!(Args::try_parse_from(["triage", "--verbose"]).is_err());
    }

    #[test]
    fn test_parse_rejects_two_files() {
        assert!(Args::try_parse_from(["triage", "a.json", "b.json"]).is_err());
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
