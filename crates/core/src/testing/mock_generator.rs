//! Mock response generator for testing.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::generator::{GeneratedText, GenerationRequest, GeneratorError, ResponseGenerator};

/// Mock implementation of the ResponseGenerator trait.
///
/// Returns a configurable response, records every request and can simulate
/// API failures and slow responses.
pub struct MockGenerator {
    model: String,
    response: RwLock<String>,
    failure: RwLock<Option<String>>,
    delay: RwLock<Option<Duration>>,
    requests: RwLock<Vec<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            response: RwLock::new("Mock generated response.".to_string()),
            failure: RwLock::new(None),
            delay: RwLock::new(None),
            requests: RwLock::new(Vec::new()),
        }
    }

    pub async fn set_response(&self, text: &str) {
        *self.response.write().await = text.to_string();
    }

    /// Fail every request with an API error carrying this message.
    pub async fn set_failure(&self, message: &str) {
        *self.failure.write().await = Some(message.to_string());
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl ResponseGenerator for MockGenerator {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedText, GeneratorError> {
        self.requests.write().await.push(request);

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.failure.read().await.clone() {
            return Err(GeneratorError::Api {
                status: 503,
                message,
            });
        }

        Ok(GeneratedText {
            text: self.response.read().await.clone(),
            model: self.model.clone(),
        })
    }
}
