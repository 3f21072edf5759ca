use crate::error::LeafError;
use crate::services::providers::{GenerationRequest, GenerativeModel};
use std::sync::Arc;

/// Relays farmer questions to the chat model under a fixed persona.
pub struct ChatRelay {
    provider: Arc<dyn GenerativeModel>,
    model: String,
}

impl ChatRelay {
    pub fn new(provider: Arc<dyn GenerativeModel>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub async fn reply(&self, message: &str) -> Result<String, LeafError> {
        let request = GenerationRequest::text(self.model.clone(), persona_prompt(message));
        let response = self.provider.generate(&request).await?;

        tracing::debug!(
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            finish_reason = ?response.finish_reason,
            "Chat model replied"
        );

        match response.text {
            Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            _ => Err(LeafError::EmptyReply),
        }
    }
}

pub fn persona_prompt(message: &str) -> String {
    format!(
        "You are Kalpataru, an AI farming assistant. Answer clearly and practically. \
         The user asks: {}",
        message
    )
}
