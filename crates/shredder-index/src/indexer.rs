//! Project indexing orchestrator: walk → chunk → embed → build.

use std::path::Path;
use std::sync::Arc;

use shredder_llm::LlmProvider;

use crate::chunk::Chunk;
use crate::embedder::embed_chunks;
use crate::error::Result;
use crate::extractor::{ExtractorConfig, extract};
use crate::vector_index::VectorIndex;

/// Indexer configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub extractor: ExtractorConfig,
    /// Embedding requests in flight at once.
    pub embedding_concurrency: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            embedding_concurrency: 8,
        }
    }
}

/// Summary of an indexing run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IndexReport {
    pub files_visited: usize,
    pub files_failed: usize,
    pub files_skipped: usize,
    pub chunks_created: usize,
    pub chunks_embedded: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

impl IndexReport {
    /// Fraction of chunks that received an embedding; 0 when none were created.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn embedding_coverage(&self) -> f64 {
        if self.chunks_created == 0 {
            return 0.0;
        }
        self.chunks_embedded as f64 / self.chunks_created as f64
    }
}

impl std::fmt::Display for IndexReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "visited {} files ({} failed, {} skipped), created {} chunks, embedded {} of {} chunks in {} ms",
            self.files_visited,
            self.files_failed,
            self.files_skipped,
            self.chunks_created,
            self.chunks_embedded,
            self.chunks_created,
            self.duration_ms
        )
    }
}

/// Output of a full indexing run.
#[derive(Debug)]
pub struct ProjectIndex {
    /// Every extracted chunk in walk order, with embeddings where available.
    pub chunks: Vec<Chunk>,
    pub index: Arc<VectorIndex>,
    pub report: IndexReport,
}

/// Builds an in-memory index over a project tree.
pub struct CodeIndexer<P: LlmProvider> {
    provider: Arc<P>,
    config: IndexerConfig,
}

impl<P: LlmProvider + 'static> CodeIndexer<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, config: IndexerConfig) -> Self {
        Self { provider, config }
    }

    /// Extract, embed and index everything under `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a directory or the embeddings
    /// disagree on dimensionality. Per-file and per-chunk failures are
    /// reported in [`IndexReport`] instead.
    pub async fn index_project(&self, root: &Path) -> Result<ProjectIndex> {
        let start = std::time::Instant::now();

        let extraction = extract(root, &self.config.extractor).await?;
        let mut report = IndexReport {
            files_visited: extraction.files_visited,
            files_failed: extraction.failures.len(),
            files_skipped: extraction.files_skipped,
            chunks_created: extraction.chunks.len(),
            ..IndexReport::default()
        };
        report.errors.extend(
            extraction
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.path, f.reason)),
        );
        report
            .errors
            .extend(extraction.walk_errors.iter().map(|e| format!("walk: {e}")));

        let mut chunks = extraction.chunks;
        let outcome = embed_chunks(
            &self.provider,
            &mut chunks,
            self.config.embedding_concurrency,
        )
        .await;
        report.chunks_embedded = outcome.embedded;
        report.errors.extend(outcome.errors);

        let index = VectorIndex::from_chunks(chunks.iter().cloned())?;

        report.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        tracing::info!(
            files = report.files_visited,
            failed = report.files_failed,
            chunks = report.chunks_created,
            embedded = report.chunks_embedded,
            duration_ms = report.duration_ms,
            "index built"
        );

        Ok(ProjectIndex {
            chunks,
            index: Arc::new(index),
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_index::SimilaritySearch;
    use shredder_llm::mock::MockProvider;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("app.py"),
            "def load():\n    return 1\n\ndef save():\n    return 2\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("readme.txt"), "The app loads and saves.").unwrap();
        std::fs::write(dir.path().join("broken.py"), "def (:\n").unwrap();
        dir
    }

    #[test]
    fn default_config() {
        let config = IndexerConfig::default();
        assert_eq!(config.embedding_concurrency, 8);
        assert_eq!(config.extractor.workers, 4);
    }

    #[test]
    fn coverage() {
        let report = IndexReport {
            chunks_created: 4,
            chunks_embedded: 3,
            ..IndexReport::default()
        };
        assert!((report.embedding_coverage() - 0.75).abs() < f64::EPSILON);
        assert!(IndexReport::default().embedding_coverage().abs() < f64::EPSILON);
        assert!(report.to_string().contains("embedded 3 of 4 chunks"));
    }

    #[tokio::test]
    async fn full_run_reports_counts() {
        let dir = project();
        let indexer = CodeIndexer::new(Arc::new(MockProvider::default()), IndexerConfig::default());
        let built = indexer.index_project(dir.path()).await.unwrap();

        assert_eq!(built.report.files_visited, 3);
        assert_eq!(built.report.files_failed, 1);
        assert_eq!(built.report.chunks_created, 4);
        assert_eq!(built.report.chunks_embedded, 4);
        assert_eq!(built.report.errors.len(), 1);
        assert!(built.report.errors[0].starts_with("broken.py"));
        assert_eq!(built.index.len(), 4);
        assert!(built.chunks.iter().all(Chunk::is_embedded));
    }

    #[tokio::test]
    async fn unreachable_embedder_gives_empty_index() {
        let dir = project();
        let indexer = CodeIndexer::new(Arc::new(MockProvider::unreachable()), IndexerConfig::default());
        let built = indexer.index_project(dir.path()).await.unwrap();

        assert_eq!(built.report.chunks_created, 4);
        assert_eq!(built.report.chunks_embedded, 0);
        assert!(built.index.is_empty());
        assert!(built.report.to_string().contains("embedded 0 of 4 chunks"));
    }

    #[tokio::test]
    async fn mixed_dimensions_are_fatal() {
        let dir = project();
        let provider = MockProvider::default().with_embedding("The app loads and saves.", vec![1.0]);
        let indexer = CodeIndexer::new(Arc::new(provider), IndexerConfig::default());
        let err = indexer.index_project(dir.path()).await.unwrap_err();
        assert!(matches!(err, crate::IndexError::DimensionMismatch { .. }), "{err:?}");
    }
}
