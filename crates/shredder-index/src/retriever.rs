//! Query → embed → search → prompt → answer.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use shredder_llm::{LlmError, LlmProvider, Message};
use tokio::time::Instant;

use crate::chunk::Chunk;
use crate::error::IndexError;
use crate::vector_index::{SimilaritySearch, VectorIndex};

pub const DEFAULT_SEPARATOR: &str = "\n\n";

/// Retrieval configuration.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Chunks fetched per query.
    pub top_k: usize,
    /// Placed between consecutive chunk texts in the context block.
    pub separator: String,
    /// Deadline covering embedding, search and generation. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            separator: DEFAULT_SEPARATOR.into(),
            timeout: Some(Duration::from_secs(300)),
        }
    }
}

/// Pipeline step that was running when the deadline elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    QueryEmbedding,
    Search,
    AnswerGeneration,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::QueryEmbedding => "query embedding",
            Self::Search => "search",
            Self::AnswerGeneration => "answer generation",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("query embedding failed: {0}")]
    QueryEmbeddingFailed(#[source] LlmError),

    #[error("search failed: {0}")]
    Search(#[from] IndexError),

    #[error("answer generation failed: {0}")]
    AnswerGenerationFailed(#[source] LlmError),

    #[error("deadline exceeded during {stage}")]
    Timeout { stage: Stage },
}

/// A chunk returned by a search, with its distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Generated answer and the chunks it was grounded on, nearest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<RetrievedChunk>,
}

/// Answers questions against a built index.
pub struct Retriever<P: LlmProvider, S: SimilaritySearch = VectorIndex> {
    provider: Arc<P>,
    index: Arc<S>,
    config: RetrievalConfig,
}

impl<P: LlmProvider, S: SimilaritySearch> Retriever<P, S> {
    #[must_use]
    pub fn new(provider: Arc<P>, index: Arc<S>, config: RetrievalConfig) -> Self {
        Self {
            provider,
            index,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Embed `query` and return the `top_k` nearest chunks.
    ///
    /// # Errors
    ///
    /// `QueryEmbeddingFailed` if the query cannot be embedded, `Search` if the
    /// index rejects the query (empty index, dimension mismatch), `Timeout`
    /// if the configured deadline elapses.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        let deadline = self.deadline();
        self.retrieve_before(query, deadline).await
    }

    /// Retrieve context for `query` and ask the chat model to answer it.
    ///
    /// # Errors
    ///
    /// Any error of [`Retriever::retrieve`], plus `AnswerGenerationFailed` if
    /// the chat request fails or returns no text. No partial answer is ever
    /// returned.
    pub async fn answer(&self, query: &str) -> Result<Answer, RetrievalError> {
        let deadline = self.deadline();
        let sources = self.retrieve_before(query, deadline).await?;

        let context = build_context(&sources, &self.config.separator);
        let prompt = build_prompt(&context, query);
        tracing::debug!(
            sources = sources.len(),
            prompt_len = prompt.len(),
            "sending prompt"
        );

        let text = within(
            deadline,
            Stage::AnswerGeneration,
            self.provider.chat(&[Message::user(prompt)]),
        )
        .await?
        .map_err(RetrievalError::AnswerGenerationFailed)?;

        Ok(Answer { text, sources })
    }

    async fn retrieve_before(
        &self,
        query: &str,
        deadline: Option<Instant>,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        let vector = within(deadline, Stage::QueryEmbedding, self.provider.embed(query))
            .await?
            .map_err(RetrievalError::QueryEmbeddingFailed)?;

        let sources: Vec<RetrievedChunk> = self
            .index
            .query(&vector, self.config.top_k)?
            .into_iter()
            .map(|hit| RetrievedChunk {
                chunk: hit.chunk.clone(),
                distance: hit.distance,
            })
            .collect();

        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(RetrievalError::Timeout {
                stage: Stage::Search,
            });
        }

        tracing::debug!(query, hits = sources.len(), "retrieved");
        Ok(sources)
    }

    fn deadline(&self) -> Option<Instant> {
        self.config.timeout.map(|t| Instant::now() + t)
    }
}

async fn within<T>(
    deadline: Option<Instant>,
    stage: Stage,
    fut: impl Future<Output = T>,
) -> Result<T, RetrievalError> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| RetrievalError::Timeout { stage }),
        None => Ok(fut.await),
    }
}

/// Join chunk texts nearest first.
#[must_use]
pub fn build_context(sources: &[RetrievedChunk], separator: &str) -> String {
    sources
        .iter()
        .map(|s| s.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Fill the answer instruction template.
#[must_use]
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Based on the following code context, answer the user's question. \
         Be concise and directly address the question using only the provided context if possible. \
         If the context doesn't contain enough information, state that.\n\n\
         Code Context:\n```\n{context}\n```\n\n\
         User Question: {question}\n\n\
         Answer:"
    )
}
