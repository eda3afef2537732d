//! Mock knowledge base for testing.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, RwLock};

use crate::tools::{KnowledgeBase, KnowledgeMatch, StaticKnowledgeBase, ToolError};

/// Mock implementation of the KnowledgeBase trait.
///
/// Provides controllable behavior for testing:
/// - Return a fixed match, or delegate to the built-in table
/// - Record queries for assertions
/// - Simulate failures and slow lookups
///
/// # Example
///
/// ```rust,ignore
/// use triage_core::testing::MockKnowledgeBase;
///
/// let kb = MockKnowledgeBase::with_builtin();
/// kb.set_delay(Duration::from_millis(200)).await;
///
/// // ... run a ticket ...
/// kb.wait_for_search().await;
/// assert_eq!(kb.search_count().await, 1);
/// ```
pub struct MockKnowledgeBase {
    /// Used when no fixed result is configured.
    fallback: Option<StaticKnowledgeBase>,
    /// Fixed result, overrides the fallback table.
    result: RwLock<Option<Option<KnowledgeMatch>>>,
    /// If set, every search fails with this reason.
    failure: RwLock<Option<String>>,
    delay: RwLock<Option<Duration>>,
    queries: RwLock<Vec<String>>,
    searched: Notify,
}

impl std::fmt::Debug for MockKnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockKnowledgeBase")
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl Default for MockKnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl MockKnowledgeBase {
    /// A knowledge base that never matches.
    pub fn new() -> Self {
        Self {
            fallback: None,
            result: RwLock::new(None),
            failure: RwLock::new(None),
            delay: RwLock::new(None),
            queries: RwLock::new(Vec::new()),
            searched: Notify::new(),
        }
    }

    /// A knowledge base answering from the built-in topic table.
    pub fn with_builtin() -> Self {
        Self {
            fallback: StaticKnowledgeBase::builtin().ok(),
            ..Self::new()
        }
    }

    /// Return this result for every search.
    pub async fn set_result(&self, result: Option<KnowledgeMatch>) {
        *self.result.write().await = Some(result);
    }

    /// Fail every search with the given reason.
    pub async fn set_failure(&self, reason: &str) {
        *self.failure.write().await = Some(reason.to_string());
    }

    pub async fn clear_failure(&self) {
        *self.failure.write().await = None;
    }

    /// Sleep before answering each search.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub async fn recorded_queries(&self) -> Vec<String> {
        self.queries.read().await.clone()
    }

    pub async fn search_count(&self) -> usize {
        self.queries.read().await.len()
    }

    /// Wait until a search has started.
    pub async fn wait_for_search(&self) {
        self.searched.notified().await;
    }
}

#[async_trait]
impl KnowledgeBase for MockKnowledgeBase {
    fn name(&self) -> &str {
        "mock_knowledge_base"
    }

    async fn search(&self, query: &str) -> Result<Option<KnowledgeMatch>, ToolError> {
        self.queries.write().await.push(query.to_string());
        self.searched.notify_one();

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(reason) = self.failure.read().await.clone() {
            return Err(ToolError::Unavailable {
                tool: self.name().to_string(),
                reason,
            });
        }

        if let Some(result) = self.result.read().await.clone() {
            return Ok(result);
        }

        match &self.fallback {
            Some(kb) => kb.search(query).await,
            None => Ok(None),
        }
    }
}
