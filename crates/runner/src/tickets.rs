//! Ticket input for the runner.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use triage_core::Ticket;

/// A ticket as submitted by a caller. The id is generated when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketInput {
    #[serde(default, alias = "ticket_id")]
    pub id: Option<String>,
    pub customer_id: String,
    pub subject: String,
    pub description: String,
}

impl TicketInput {
    pub fn into_ticket(self) -> Ticket {
        match self.id {
            Some(id) => Ticket::with_id(id, self.customer_id, self.subject, self.description),
            None => Ticket::new(self.customer_id, self.subject, self.description),
        }
    }
}

/// Parse a JSON array of tickets.
pub fn parse_tickets(json: &str) -> Result<Vec<Ticket>> {
    let inputs: Vec<TicketInput> =
        serde_json::from_str(json).context("Tickets must be a JSON array of objects")?;
    Ok(inputs.into_iter().map(TicketInput::into_ticket).collect())
}

pub fn load_tickets(path: &Path) -> Result<Vec<Ticket>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tickets from {:?}", path))?;
    parse_tickets(&json)
}

/// Tickets used when no input file is given.
pub fn demo_tickets() -> Vec<Ticket> {
    [
        ("DEMO-1", "CUST-001", "Cannot login", "I forgot my password and need access urgently"),
        ("DEMO-2", "CUST-002", "Refund request", "I was charged twice, please refund the duplicate payment"),
        ("DEMO-3", "CUST-003", "App keeps crashing", "The app crashes on startup since the last update"),
        ("DEMO-4", "CUST-004", "Question about hours", "What are your support hours?"),
        ("DEMO-5", "CUST-002", "Widget", "Something weird happened with the widget, this is urgent"),
    ]
    .into_iter()
    .map(|(id, customer, subject, description)| Ticket::with_id(id, customer, subject, description))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_tickets_with_and_without_ids() {
        let json = r#"[
            {"ticket_id": "T-1", "customer_id": "C-1", "subject": "Refund", "description": "Please refund"},
            {"customer_id": "C-2", "subject": "Login", "description": "Forgot password"}
        ]"#;
        let tickets = parse_tickets(json).unwrap();
        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].id, "T-1");
        assert!(tickets[1].id.starts_with("TKT-"));
        assert_eq!(tickets[1].customer_id, "C-2");
    }

    #[test]
    fn test_parse_tickets_rejects_object() {
        assert!(parse_tickets(r#"{"customer_id": "C-1"}"#).is_err());
    }

    #[test]
    fn test_load_tickets_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "F-1", "customer_id": "C", "subject": "s", "description": "d"}}]"#
        )
        .unwrap();
        let tickets = load_tickets(file.path()).unwrap();
        assert_eq!(tickets[0].id, "F-1");
    }

    #[test]
    fn test_demo_tickets_are_valid() {
        for ticket in demo_tickets() {
            assert!(ticket.validate().is_ok());
        }
    }
}
