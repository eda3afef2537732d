//! Ticket data model and lifecycle.

mod types;

pub use types::{
    Ticket, TicketCategory, TicketError, TicketStatus, ValidationError, DEFAULT_PRIORITY,
    HIGHEST_PRIORITY, LOWEST_PRIORITY,
};
