//! Specialists: compose resolution text for a routed ticket.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::generator::{GenerationRequest, ResponseGenerator};
use crate::memory::{CustomerContext, MemoryBank, MemoryConfig, MemoryRecord};
use crate::stages::types::{SpecialistKind, SpecialistOutput, StageError};
use crate::ticket::{Ticket, TicketStatus};
use crate::tools::{KnowledgeBase, KnowledgeMatch};

/// Tickets at or above this priority (numerically at or below) escalate
/// when no remediation is found.
pub const ESCALATION_PRIORITY: u8 = 2;

const RESPONSE_REQUIREMENTS: &str = "RESPONSE REQUIREMENTS:
1. Be professional, empathetic and concise
2. Provide clear, numbered, actionable steps when applicable
3. Personalize based on the customer context
4. If the ticket is urgent, acknowledge the priority
5. Include next steps or an escalation path if needed
6. Keep the response under 250 words
7. End with an offer for further assistance";

/// Runs the specialist for a routed ticket.
pub struct SpecialistStage {
    knowledge_base: Arc<dyn KnowledgeBase>,
    memory: Arc<dyn MemoryBank>,
    memory_config: MemoryConfig,
    generator: Option<Arc<dyn ResponseGenerator>>,
    max_tokens: u32,
    temperature: f32,
}

impl SpecialistStage {
    pub fn new(
        knowledge_base: Arc<dyn KnowledgeBase>,
        memory: Arc<dyn MemoryBank>,
        memory_config: MemoryConfig,
    ) -> Self {
        Self {
            knowledge_base,
            memory,
            memory_config,
            generator: None,
            max_tokens: 512,
            temperature: 0.2,
        }
    }

    /// Use a generator for response text, keeping templates as fallback.
    pub fn with_generator(
        mut self,
        generator: Arc<dyn ResponseGenerator>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        self.generator = Some(generator);
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn run(
        &self,
        kind: SpecialistKind,
        mut ticket: Ticket,
        context: &CustomerContext,
    ) -> Result<(Ticket, SpecialistOutput), StageError> {
        tracing::info!("{} specialist processing ticket {}", kind, ticket.id);

        let found = match self.knowledge_base.search(&ticket.text()).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(
                    ticket_id = %ticket.id,
                    tool = self.knowledge_base.name(),
                    error = %e,
                    "Knowledge base unavailable, handing off"
                );
                ticket.set_metadata("kb_error", e.to_string());
                None
            }
        };

        let similar = match &found {
            Some(_) => self.similar_resolution(&ticket).await,
            None => None,
        };

        let template = match &found {
            Some(m) => compose_solution(kind, &ticket, m, similar.as_ref()),
            None => compose_handoff(kind, &ticket),
        };

        let mut generated_by = None;
        let response_text = match &self.generator {
            Some(generator) => {
                let request = build_request(kind, &ticket, context, found.as_ref())
                    .with_max_tokens(self.max_tokens)
                    .with_temperature(self.temperature);
                match generator.generate(request).await {
                    Ok(generated) => {
                        generated_by = Some(generated.model);
                        generated.text
                    }
                    Err(e) => {
                        tracing::warn!(
                            ticket_id = %ticket.id,
                            provider = generator.provider(),
                            error = %e,
                            "Generator failed, using template response"
                        );
                        ticket.set_metadata("generator_error", e.to_string());
                        template
                    }
                }
            }
            None => template,
        };

        let needs_handoff = found.is_none();
        if needs_handoff {
            ticket.set_metadata("needs_handoff", true);
            if ticket.priority <= ESCALATION_PRIORITY {
                let reason = format!(
                    "no knowledge base solution for priority {} ticket",
                    ticket.priority
                );
                tracing::info!(ticket_id = %ticket.id, reason = %reason, "Escalating ticket");
                ticket.set_metadata("escalation_reason", reason);
                ticket.transition_to(TicketStatus::Escalated)?;
            }
        }

        let kb_topic = found.as_ref().map(|m| m.entry.topic.clone());
        if let Some(topic) = &kb_topic {
            ticket.set_metadata("kb_topic", topic.as_str());
        }

        let output = SpecialistOutput {
            specialist: kind,
            response_text,
            kb_topic,
            needs_handoff,
            generated_by,
            referenced_ticket: similar.map(|r| r.ticket_id),
        };
        Ok((ticket, output))
    }

    /// Best past resolution in the ticket's category that clears the quality bar.
    async fn similar_resolution(&self, ticket: &Ticket) -> Option<MemoryRecord> {
        let category = ticket.category?;
        self.memory
            .get_similar_resolutions(category, self.memory_config.similar_limit)
            .await
            .into_iter()
            .find(|r| {
                r.ticket_id != ticket.id && r.quality_score >= self.memory_config.similar_min_quality
            })
    }
}

fn closing(kind: SpecialistKind) -> &'static str {
    match kind {
        SpecialistKind::Technical => {
            "If the problem persists after these steps, reply with your device model and app version so our technical team can investigate."
        }
        SpecialistKind::Billing => {
            "Any billing adjustment will be confirmed by email and will appear in your payment history."
        }
        SpecialistKind::General => {
            "You can find more answers in our help center, and our support team is happy to help with anything else."
        }
    }
}

/// Template response built from a knowledge base entry.
pub fn compose_solution(
    kind: SpecialistKind,
    ticket: &Ticket,
    found: &KnowledgeMatch,
    similar: Option<&MemoryRecord>,
) -> String {
    let entry = &found.entry;
    let mut text = format!(
        "Thank you for contacting us about \"{}\".\n\nHere is how to resolve this ({}):\n\n",
        ticket.subject, entry.title
    );
    for (i, step) in entry.steps.iter().enumerate() {
        let _ = writeln!(text, "{}. {}", i + 1, step);
    }
    if !entry.notes.is_empty() {
        text.push_str("\nNotes:\n");
        for note in &entry.notes {
            let _ = writeln!(text, "- {}", note);
        }
    }
    if let Some(record) = similar {
        let _ = write!(
            text,
            "\nA similar request (ticket {}) was resolved successfully with this approach.\n",
            record.ticket_id
        );
    }
    text.push('\n');
    text.push_str(closing(kind));
    text
}

/// Response for tickets with no documented solution.
pub fn compose_handoff(kind: SpecialistKind, ticket: &Ticket) -> String {
    format!(
        "Thank you for contacting us about \"{}\".\n\n\
         We could not find a documented solution for this request, so it has been handed \
         to our {} support team. A specialist will review your case and follow up within 24 hours.\n\n\
         If you need immediate assistance, please contact our support line.",
        ticket.subject, kind
    )
}

/// Generator request for a ticket.
pub fn build_request(
    kind: SpecialistKind,
    ticket: &Ticket,
    context: &CustomerContext,
    found: Option<&KnowledgeMatch>,
) -> GenerationRequest {
    let system = format!(
        "You are a {} at a customer support company. Your task is to write a helpful, \
         professional and accurate response to a customer support ticket.\n\n{}",
        kind.role(),
        RESPONSE_REQUIREMENTS
    );

    let category = ticket.category.map_or("unknown", |c| c.as_str());
    let tier = context.tier.map_or("standard", |t| t.as_str());
    let mut prompt = format!(
        "TICKET INFORMATION:\n\
         - Ticket ID: {}\n\
         - Subject: {}\n\
         - Description: {}\n\
         - Category: {}\n\
         - Priority: {}\n\n\
         CUSTOMER CONTEXT:\n\
         - Customer ID: {}\n\
         - Previous Tickets: {}\n\
         - Customer Tier: {}\n",
        ticket.id,
        ticket.subject,
        ticket.description,
        category,
        ticket.priority,
        context.customer_id,
        context.total_tickets(),
        tier,
    );
    if let Some(name) = ticket.metadata_str("customer_name") {
        let _ = writeln!(prompt, "- Name: {}", name);
    }

    if let Some(m) = found {
        let _ = write!(
            prompt,
            "\nKNOWLEDGE BASE INFORMATION ({}):\n",
            m.entry.title
        );
        for (i, step) in m.entry.steps.iter().enumerate() {
            let _ = writeln!(prompt, "{}. {}", i + 1, step);
        }
        for note in &m.entry.notes {
            let _ = writeln!(prompt, "Note: {}", note);
        }
        prompt.push_str("\nUse this information to provide accurate steps and solutions.\n");
    } else {
        prompt.push_str(
            "\nNo knowledge base article matched. Acknowledge the request and explain that a specialist will follow up.\n",
        );
    }
    prompt.push_str("\nGenerate the response now:");

    GenerationRequest::new(prompt).with_system(system)
}
