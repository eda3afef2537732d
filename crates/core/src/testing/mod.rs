//! Testing utilities and mock implementations.
//!
//! Mocks for the capability traits, so the full pipeline can be exercised
//! without real knowledge bases or language-model endpoints.
//!
//! # Example
//!
//! ```rust,ignore
//! use triage_core::testing::{fixtures, MockGenerator, MockKnowledgeBase};
//!
//! let kb = MockKnowledgeBase::with_builtin();
//! let generator = MockGenerator::new("mock-model");
//! generator.set_failure("quota exceeded").await;
//! ```

mod mock_generator;
mod mock_knowledge_base;

pub use mock_generator::MockGenerator;
pub use mock_knowledge_base::MockKnowledgeBase;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::NaiveDate;

    use crate::ticket::Ticket;
    use crate::tools::{CustomerProfile, CustomerTier, StaticCrm};

    /// A known customer profile.
    pub fn customer(id: &str, name: &str, tier: CustomerTier) -> CustomerProfile {
        CustomerProfile {
            customer_id: id.to_string(),
            name: Some(name.to_string()),
            tier,
            signup_date: NaiveDate::from_ymd_opt(2023, 1, 15),
            open_tickets: 1,
            lifetime_value: 480.0,
            account_status: "active".to_string(),
            known: true,
        }
    }

    /// A CRM with a standard, a premium and an enterprise customer.
    pub fn sample_crm() -> StaticCrm {
        StaticCrm::new(vec![
            customer("CUST-001", "Alice", CustomerTier::Premium),
            customer("CUST-002", "Bob", CustomerTier::Standard),
            customer("CUST-003", "Carol", CustomerTier::Enterprise),
        ])
    }

    /// A new ticket with a fixed id.
    pub fn ticket(id: &str, customer_id: &str, subject: &str, description: &str) -> Ticket {
        Ticket::with_id(id, customer_id, subject, description)
    }
}
