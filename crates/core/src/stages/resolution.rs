//! Resolution: personalize, score, persist and close a ticket.

use std::sync::Arc;

use crate::memory::{CustomerContext, MemoryBank, MemoryRecord};
use crate::stages::types::{ResolutionOutput, SpecialistOutput, StageError};
use crate::ticket::{Ticket, TicketCategory, TicketStatus};

/// Maximum rubric score.
pub const MAX_QUALITY: f32 = 5.0;

/// Which personal touches made it into a response.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Personalization {
    pub named: bool,
    pub tier_acknowledged: bool,
}

fn vocabulary(category: TicketCategory) -> &'static [&'static str] {
    match category {
        TicketCategory::Technical => &[
            "restart", "update", "reinstall", "settings", "sign in", "sign-in", "password",
            "cache", "version", "device", "sync",
        ],
        TicketCategory::Billing => &[
            "billing", "refund", "invoice", "charge", "payment", "subscription", "plan",
        ],
        TicketCategory::General | TicketCategory::Urgent => &[
            "help center", "account", "support", "settings", "documentation", "information",
        ],
    }
}

fn numbered_steps(text: &str) -> usize {
    text.lines()
        .filter(|line| {
            let line = line.trim_start();
            let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
            digits > 0 && line[digits..].starts_with(". ")
        })
        .count()
}

/// Deterministic 0-5 rubric.
///
/// Length up to 1.5, numbered steps up to 1.5, personalization up to 1.0 and
/// category vocabulary up to 1.0.
pub fn score_quality(text: &str, personalization: Personalization, category: TicketCategory) -> f32 {
    let length = text.trim().chars().count();
    let length_score = match length {
        n if n >= 200 => 1.5,
        n if n >= 100 => 1.0,
        n if n >= 40 => 0.5,
        _ => 0.0,
    };

    let steps_score = match numbered_steps(text) {
        n if n >= 3 => 1.5,
        n if n >= 1 => 1.0,
        _ => 0.0,
    };

    let mut personal_score = 0.0;
    if personalization.named {
        personal_score += 0.5;
    }
    if personalization.tier_acknowledged {
        personal_score += 0.5;
    }

    let lower = text.to_lowercase();
    let terms = vocabulary(category)
        .iter()
        .filter(|term| lower.contains(*term))
        .count();
    let vocabulary_score = (terms as f32 * 0.5).min(1.0);

    (length_score + steps_score + personal_score + vocabulary_score).clamp(0.0, MAX_QUALITY)
}

/// Wrap specialist text with greeting and customer acknowledgements.
pub fn personalize(ticket: &Ticket, context: &CustomerContext, body: &str) -> (String, Personalization) {
    let mut personalization = Personalization::default();
    let mut text = match ticket.metadata_str("customer_name") {
        Some(name) => {
            personalization.named = true;
            format!("Hi {},\n\n", name)
        }
        None => "Hello,\n\n".to_string(),
    };

    if let Some(tier) = context.tier.filter(|t| t.is_valued()) {
        personalization.tier_acknowledged = true;
        text.push_str(&format!(
            "As a valued {} customer, your request has been given priority attention.\n",
            tier
        ));
    }
    if ticket.metadata.get("priority_handling").and_then(|v| v.as_bool()) == Some(true) {
        text.push_str("We understand this is urgent and have prioritized your request.\n");
    }
    match context.total_tickets() {
        0 => {}
        1 => text.push_str("We can see you have contacted us once before, and we have that history at hand.\n"),
        n => text.push_str(&format!(
            "We can see you have contacted us {} times before, and we have that history at hand.\n",
            n
        )),
    }
    if !text.ends_with("\n\n") {
        text.push('\n');
    }
    text.push_str(body.trim());
    (text, personalization)
}

fn boilerplate(ticket: &Ticket) -> String {
    format!(
        "\n\n---\nTicket reference: {}\nPriority: {}\n\
         If this does not resolve your issue, reply to this message quoting your ticket reference and we will follow up.",
        ticket.id, ticket.priority
    )
}

/// Resolution stage.
pub struct ResolutionStage {
    memory: Arc<dyn MemoryBank>,
}

impl ResolutionStage {
    pub fn new(memory: Arc<dyn MemoryBank>) -> Self {
        Self { memory }
    }

    pub async fn run(
        &self,
        mut ticket: Ticket,
        context: &CustomerContext,
        specialist: &SpecialistOutput,
    ) -> Result<(Ticket, ResolutionOutput), StageError> {
        let (personalized, personalization) =
            personalize(&ticket, context, &specialist.response_text);
        let rubric_category = specialist.specialist.category();
        let quality_score = score_quality(&personalized, personalization, rubric_category);
        let resolution_text = format!("{}{}", personalized, boilerplate(&ticket));

        let category = ticket.category.unwrap_or(rubric_category);
        self.memory
            .store(MemoryRecord::new(
                ticket.id.clone(),
                ticket.customer_id.clone(),
                category,
                resolution_text.clone(),
                quality_score,
            ))
            .await?;

        ticket.set_metadata("quality_score", f64::from(quality_score));
        if !ticket.is_terminal() {
            ticket.transition_to(TicketStatus::Resolved)?;
        }

        tracing::info!(
            "Ticket {} finished as {} with quality {:.1}",
            ticket.id,
            ticket.status,
            quality_score
        );

        Ok((
            ticket,
            ResolutionOutput {
                quality_score,
                resolution_text,
            },
        ))
    }
}
