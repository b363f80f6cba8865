//! Concurrent embedding of a chunk set.

use std::sync::Arc;

use shredder_llm::LlmProvider;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::chunk::Chunk;

/// How many chunks got a vector.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EmbeddingOutcome {
    pub embedded: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Embed every chunk's text with at most `concurrency` requests in flight.
///
/// Successful vectors are attached to `chunks[i].embedding` by position.
/// A failed chunk keeps `embedding == None` and is counted, never fatal.
pub async fn embed_chunks<P>(
    provider: &Arc<P>,
    chunks: &mut [Chunk],
    concurrency: usize,
) -> EmbeddingOutcome
where
    P: LlmProvider + 'static,
{
    let total = chunks.len();
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set = JoinSet::new();

    for (position, chunk) in chunks.iter().enumerate() {
        let provider = Arc::clone(provider);
        let semaphore = Arc::clone(&semaphore);
        let text = chunk.text.clone();
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (position, provider.embed(&text).await)
        });
    }

    let mut outcome = EmbeddingOutcome::default();
    let mut done = 0usize;
    while let Some(result) = join_set.join_next().await {
        let Ok((position, embed_result)) = result else {
            tracing::warn!("embedding task panicked");
            outcome.failed += 1;
            continue;
        };
        done += 1;
        let chunk = &mut chunks[position];
        match embed_result {
            Ok(vector) => {
                tracing::debug!(
                    chunk = %chunk.display_header(),
                    dimension = vector.len(),
                    progress = format_args!("{done}/{total}"),
                    "embedded"
                );
                chunk.embedding = Some(vector);
                outcome.embedded += 1;
            }
            Err(e) => {
                tracing::warn!(chunk = %chunk.display_header(), error = %e, "embedding unavailable");
                outcome
                    .errors
                    .push(format!("{}: {e}", chunk.display_header()));
                outcome.failed += 1;
            }
        }
    }

    tracing::info!(
        embedded = outcome.embedded,
        total,
        "embedded {} of {total} chunks",
        outcome.embedded
    );
    outcome
}
