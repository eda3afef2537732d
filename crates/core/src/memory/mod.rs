//! Memory bank: per-customer history of processed tickets.
//!
//! Used for personalization (customer context) and for surfacing
//! high-quality past resolutions to specialists.

mod bank;
mod types;

pub use bank::{InMemoryBank, MemoryBank};
pub use types::{CustomerContext, HistorySummary, MemoryConfig, MemoryError, MemoryRecord};
