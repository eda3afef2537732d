//! Capability traits consumed by the pipeline stages.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::tools::crm::CustomerProfile;
use crate::tools::knowledge_base::KnowledgeMatch;

/// Errors from capability tools.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool} unavailable: {reason}")]
    Unavailable { tool: String, reason: String },

    #[error("{tool} timed out after {after:?}")]
    Timeout { tool: String, after: Duration },

    #[error("invalid knowledge base table: {0}")]
    InvalidTable(String),
}

/// Free-text lookup of remediation content.
///
/// Implementations must be read-only: searching never mutates ticket or
/// memory state.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Name of this knowledge base for logging.
    fn name(&self) -> &str;

    /// Find the best matching entry for a query. `Ok(None)` means nothing matched.
    async fn search(&self, query: &str) -> Result<Option<KnowledgeMatch>, ToolError>;
}

/// Customer account lookup.
///
/// Lookups never fail: unknown ids resolve to [`CustomerProfile::unknown`].
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Name of this directory for logging.
    fn name(&self) -> &str;

    async fn lookup(&self, customer_id: &str) -> CustomerProfile;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ToolError::Unavailable {
            tool: "knowledge_base".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "knowledge_base unavailable: connection refused");

        let err = ToolError::Timeout {
            tool: "crm".to_string(),
            after: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "crm timed out after 250ms");
    }
}
