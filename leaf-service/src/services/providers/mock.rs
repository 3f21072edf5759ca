//! Scripted provider for tests.

use super::{FinishReason, GenerationRequest, GenerativeModel, ProviderError, ProviderResponse};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Behavior {
    Reply(String),
    Empty,
    Fail(ProviderError),
}

/// Answers every request the same way and remembers what it was asked.
pub struct MockProvider {
    behavior: Behavior,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockProvider {
    fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::with(Behavior::Reply(text.into()))
    }

    /// Succeeds with no candidate text.
    pub fn empty() -> Self {
        Self::with(Behavior::Empty)
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::with(Behavior::Fail(error))
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl GenerativeModel for MockProvider {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        let text = match &self.behavior {
            Behavior::Reply(text) => Some(text.clone()),
            Behavior::Empty => None,
            Behavior::Fail(error) => return Err(error.clone()),
        };

        Ok(ProviderResponse {
            text,
            input_tokens: request.prompt_text().len() as i32 / 4,
            output_tokens: 10,
            finish_reason: FinishReason::Complete,
        })
    }
}
