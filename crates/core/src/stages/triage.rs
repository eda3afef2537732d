//! Triage: route a classified ticket to a specialist.

use crate::stages::types::{SpecialistKind, StageError, TriageOutput};
use crate::ticket::{Ticket, TicketCategory};

/// Pick the specialist for a ticket.
///
/// Urgent tickets go to the specialist for their topic and are tagged for
/// priority handling.
pub fn route(ticket: &Ticket) -> Result<TriageOutput, StageError> {
    let category = ticket.category.ok_or_else(|| StageError::NoRouteFound {
        ticket_id: ticket.id.clone(),
    })?;

    let (specialist, priority_handling) = match category {
        TicketCategory::Urgent => {
            let topic = ticket.topic.unwrap_or(TicketCategory::General);
            let specialist =
                SpecialistKind::for_category(topic).unwrap_or(SpecialistKind::General);
            (specialist, true)
        }
        other => match SpecialistKind::for_category(other) {
            Some(specialist) => (specialist, false),
            None => {
                return Err(StageError::NoRouteFound {
                    ticket_id: ticket.id.clone(),
                })
            }
        },
    };

    Ok(TriageOutput {
        specialist,
        priority_handling,
    })
}

/// Triage stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct TriageStage;

impl TriageStage {
    pub fn run(&self, mut ticket: Ticket) -> Result<(Ticket, TriageOutput), StageError> {
        let output = route(&ticket)?;
        ticket.set_metadata("specialist", output.specialist.as_str());
        if output.priority_handling {
            ticket.set_metadata("priority_handling", true);
        }
        tracing::debug!(
            ticket_id = %ticket.id,
            specialist = %output.specialist,
            priority_handling = output.priority_handling,
            "Ticket routed"
        );
        Ok((ticket, output))
    }
}
