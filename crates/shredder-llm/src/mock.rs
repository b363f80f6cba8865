//! Test-only mock LLM provider.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};

#[derive(Debug, Clone)]
pub struct MockProvider {
    embeddings: HashMap<String, Vec<f32>>,
    failing_texts: HashSet<String>,
    prompts: Arc<Mutex<Vec<String>>>,
    pub default_embedding: Option<Vec<f32>>,
    pub default_response: String,
    pub fail_chat: bool,
    pub fail_embed: bool,
    /// Milliseconds to sleep before every call returns.
    pub delay_ms: u64,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            embeddings: HashMap::new(),
            failing_texts: HashSet::new(),
            prompts: Arc::new(Mutex::new(Vec::new())),
            default_embedding: Some(vec![0.0, 0.0, 1.0]),
            default_response: "mock response".into(),
            fail_chat: false,
            fail_embed: false,
            delay_ms: 0,
        }
    }
}

impl MockProvider {
    /// Return `vector` whenever exactly `text` is embedded.
    #[must_use]
    pub fn with_embedding(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.embeddings.insert(text.into(), vector);
        self
    }

    /// Fail embedding of exactly `text`.
    #[must_use]
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failing_texts.insert(text.into());
        self
    }

    #[must_use]
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    #[must_use]
    pub fn with_chat_failure(mut self) -> Self {
        self.fail_chat = true;
        self
    }

    /// Every call fails, embeds with a 503 and chat with a missing field.
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            fail_chat: true,
            fail_embed: true,
            ..Self::default()
        }
    }

    /// Every user prompt passed to `chat`, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    async fn pause(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
    }
}

impl LlmProvider for MockProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.pause().await;
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.extend(messages.iter().map(|m| m.content.clone()));
        }
        if self.fail_chat {
            return Err(LlmError::MalformedResponse {
                endpoint: "mock://chat".into(),
                reason: "missing `message.content` field".into(),
            });
        }
        Ok(self.default_response.clone())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.pause().await;
        if self.fail_embed || self.failing_texts.contains(text) {
            return Err(LlmError::ServiceError {
                endpoint: "mock://embeddings".into(),
                status: 503,
                body: "service unavailable".into(),
            });
        }
        self.embeddings
            .get(text)
            .or(self.default_embedding.as_ref())
            .cloned()
            .ok_or_else(|| LlmError::MalformedResponse {
                endpoint: "mock://embeddings".into(),
                reason: format!("no embedding registered for {text:?}"),
            })
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_fails_embed_with_service_error() {
        let err = MockProvider::unreachable().embed("x").await.unwrap_err();
        assert!(
            matches!(err, LlmError::ServiceError { status: 503, .. }),
            "{err:?}"
        );
        assert!(MockProvider::unreachable().chat(&[Message::user("q")]).await.is_err());
    }

    #[tokio::test]
    async fn failing_text_only_fails_that_text() {
        let mock = MockProvider::default().failing_on("bad");
        assert!(matches!(
            mock.embed("bad").await,
            Err(LlmError::ServiceError { .. })
        ));
        assert_eq!(mock.embed("good").await.unwrap(), vec![0.0, 0.0, 1.0]);
    }
}
