use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::http::{HttpTimeouts, default_client};
use crate::provider::{LlmProvider, Message};
use crate::retry::send_with_retry;

/// Connection settings for an Ollama-compatible server.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub timeouts: HttpTimeouts,
    pub max_retries: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            chat_model: "qwen2.5-coder:7b".into(),
            embedding_model: "nomic-embed-text".into(),
            timeouts: HttpTimeouts::default(),
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    chat_model: String,
    embedding_model: String,
    max_retries: u32,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Option<Vec<f32>>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OllamaProvider {
    #[must_use]
    pub fn new(config: OllamaConfig) -> Self {
        let client = default_client(config.timeouts);
        Self::with_client(config, client)
    }

    #[must_use]
    pub fn with_client(config: OllamaConfig, client: reqwest::Client) -> Self {
        let mut base_url = config.base_url;
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client,
            base_url,
            chat_model: config.chat_model,
            embedding_model: config.embedding_model,
            max_retries: config.max_retries,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    #[must_use]
    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    /// Check if the server is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or the server answers with
    /// a non-success status.
    pub async fn health_check(&self) -> Result<(), LlmError> {
        let endpoint = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&endpoint).send().await.map_err(|source| {
            LlmError::ConnectionFailure {
                endpoint: endpoint.clone(),
                source,
            }
        })?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(LlmError::ServiceError {
                endpoint,
                status: status.as_u16(),
                body: String::new(),
            })
        }
    }

    /// POST `body` to `{base_url}{path}` and return the raw success body.
    async fn post_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<String, LlmError> {
        let endpoint = format!("{}{path}", self.base_url);
        let response = send_with_retry(&endpoint, self.max_retries, || {
            self.client.post(&endpoint).json(body).send()
        })
        .await?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| LlmError::ConnectionFailure {
                endpoint: endpoint.clone(),
                source,
            })?;

        if !status.is_success() {
            tracing::debug!(%endpoint, %status, "ollama request failed");
            return Err(LlmError::ServiceError {
                endpoint,
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

impl LlmProvider for OllamaProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.chat_model,
            messages,
            stream: false,
        };
        let body = self.post_json("/api/chat", &request).await?;
        parse_chat(&body).map_err(|reason| LlmError::MalformedResponse {
            endpoint: format!("{}/api/chat", self.base_url),
            reason,
        })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            prompt: text,
        };
        let body = self.post_json("/api/embeddings", &request).await?;
        parse_embedding(&body).map_err(|reason| LlmError::MalformedResponse {
            endpoint: format!("{}/api/embeddings", self.base_url),
            reason,
        })
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ollama"
    }
}

fn parse_embedding(body: &str) -> Result<Vec<f32>, String> {
    let parsed: EmbeddingResponse =
        serde_json::from_str(body).map_err(|e| format!("invalid embedding body: {e}"))?;
    match parsed.embedding {
        Some(vector) if !vector.is_empty() => Ok(vector),
        Some(_) => Err("empty `embedding` array".into()),
        None => Err("missing `embedding` field".into()),
    }
}

fn parse_chat(body: &str) -> Result<String, String> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| format!("invalid chat body: {e}"))?;
    parsed
        .message
        .and_then(|m| m.content)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| "missing `message.content` field".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OllamaProvider {
        OllamaProvider::new(OllamaConfig {
            base_url: server.uri(),
            chat_model: "chat-model".into(),
            embedding_model: "embed-model".into(),
            max_retries: 0,
            ..OllamaConfig::default()
        })
    }

    #[test]
    fn trailing_slashes_trimmed() {
        let provider = OllamaProvider::new(OllamaConfig {
            base_url: "http://localhost:11434///".into(),
            ..OllamaConfig::default()
        });
        assert_eq!(provider.base_url(), "http://localhost:11434");
    }

    #[test]
    fn default_config_points_at_local_ollama() {
        let config = OllamaConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.embedding_model, "nomic-embed-text");
    }

    #[test]
    fn parse_embedding_variants() {
        assert_eq!(
            parse_embedding(r#"{"embedding":[0.5,1.0]}"#).unwrap(),
            vec![0.5, 1.0]
        );
        assert!(parse_embedding(r#"{"embedding":[]}"#).is_err());
        assert!(parse_embedding(r#"{"embeddings":[[1.0]]}"#).is_err());
        assert!(parse_embedding("not json").is_err());
        assert!(parse_embedding(r#"{"embedding":["a"]}"#).is_err());
    }

    #[test]
    fn parse_chat_variants() {
        assert_eq!(
            parse_chat(r#"{"message":{"role":"assistant","content":"hi"}}"#).unwrap(),
            "hi"
        );
        assert!(parse_chat(r#"{"message":{"role":"assistant"}}"#).is_err());
        assert!(parse_chat(r#"{"message":{"content":""}}"#).is_err());
        assert!(parse_chat(r#"{"done":true}"#).is_err());
    }

    #[tokio::test]
    async fn embed_sends_model_and_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_json(json!({"model": "embed-model", "prompt": "fn main"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embedding": [0.1, 0.2, 0.3]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let vector = provider_for(&server).embed("fn main").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn embed_non_2xx_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let err = provider_for(&server).embed("x").await.unwrap_err();
        match err {
            LlmError::ServiceError { status, body, .. } => {
                assert_eq!(status, 404);
                assert_eq!(body, "model not found");
            }
            other => panic!("expected ServiceError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn embed_missing_field_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"vector": [1.0]})))
            .mount(&server)
            .await;

        let err = provider_for(&server).embed("x").await.unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn embed_unreachable_is_connection_failure() {
        let provider = OllamaProvider::new(OllamaConfig {
            base_url: "http://127.0.0.1:1".into(),
            max_retries: 0,
            ..OllamaConfig::default()
        });
        let err = provider.embed("x").await.unwrap_err();
        assert!(err.is_connection_failure(), "{err:?}");
    }

    #[tokio::test]
    async fn chat_sends_single_user_message_without_streaming() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({
                "model": "chat-model",
                "messages": [{"role": "user", "content": "question"}],
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": {"role": "assistant", "content": "answer"},
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = provider_for(&server)
            .chat(&[Message::user("question")])
            .await
            .unwrap();
        assert_eq!(answer, "answer");
    }

    #[tokio::test]
    async fn chat_without_content_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .chat(&[Message::user("q")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn health_check_hits_tags() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
            .expect(1)
            .mount(&server)
            .await;

        provider_for(&server).health_check().await.unwrap();
    }

    #[tokio::test]
    async fn health_check_unreachable_errors() {
        let provider = OllamaProvider::new(OllamaConfig {
            base_url: "http://127.0.0.1:1".into(),
            ..OllamaConfig::default()
        });
        assert!(provider.health_check().await.is_err());
    }

    #[test]
    fn name_returns_ollama() {
        let provider = OllamaProvider::new(OllamaConfig::default());
        assert_eq!(provider.name(), "ollama");
    }
}
