//! In-memory exact nearest-neighbor index over chunk embeddings.

use crate::chunk::Chunk;
use crate::error::{IndexError, Result};

/// A chunk with its vector. `chunk.embedding` is always `None`; the vector
/// lives here.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
    norm: f32,
}

/// One search result.
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    /// Insertion position, stable for the index lifetime.
    pub position: usize,
    /// `1 - cosine similarity`; 0 for identical direction.
    pub distance: f32,
    pub chunk: &'a Chunk,
}

/// k-nearest-neighbor lookup by cosine distance.
pub trait SimilaritySearch: Send + Sync {
    /// Return the `min(k, len)` nearest entries, closest first.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::EmptyIndex` when there is nothing to search and
    /// `IndexError::QueryDimensionMismatch` when `vector` has the wrong length.
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit<'_>>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dimension(&self) -> Option<usize>;
}

/// Brute-force cosine index. Immutable after [`VectorIndex::build`].
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimension: Option<usize>,
}

impl VectorIndex {
    /// Build an index from `(chunk, embedding)` pairs. Zero pairs is valid.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::DimensionMismatch` if vectors differ in length and
    /// `IndexError::EmptyEmbedding` for a zero-length vector.
    pub fn build(pairs: impl IntoIterator<Item = (Chunk, Vec<f32>)>) -> Result<Self> {
        let mut entries = Vec::new();
        let mut dimension = None;

        for (position, (mut chunk, embedding)) in pairs.into_iter().enumerate() {
            if embedding.is_empty() {
                return Err(IndexError::EmptyEmbedding { position });
            }
            let expected = *dimension.get_or_insert(embedding.len());
            if embedding.len() != expected {
                return Err(IndexError::DimensionMismatch {
                    position,
                    expected,
                    found: embedding.len(),
                });
            }
            chunk.embedding = None;
            let norm = l2_norm(&embedding);
            entries.push(IndexEntry {
                chunk,
                embedding,
                norm,
            });
        }

        tracing::debug!(entries = entries.len(), ?dimension, "vector index built");
        Ok(Self { entries, dimension })
    }

    /// Build from chunks, taking every attached embedding and skipping
    /// chunks without one.
    ///
    /// # Errors
    ///
    /// Same as [`VectorIndex::build`].
    pub fn from_chunks(chunks: impl IntoIterator<Item = Chunk>) -> Result<Self> {
        Self::build(chunks.into_iter().filter_map(|mut chunk| {
            let embedding = chunk.embedding.take()?;
            Some((chunk, embedding))
        }))
    }

    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&IndexEntry> {
        self.entries.get(position)
    }
}

impl SimilaritySearch for VectorIndex {
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit<'_>>> {
        let Some(expected) = self.dimension else {
            return Err(IndexError::EmptyIndex);
        };
        if vector.len() != expected {
            return Err(IndexError::QueryDimensionMismatch {
                expected,
                found: vector.len(),
            });
        }

        let query_norm = l2_norm(vector);
        let mut hits: Vec<SearchHit<'_>> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| SearchHit {
                position,
                distance: 1.0 - similarity(vector, query_norm, &entry.embedding, entry.norm),
                chunk: &entry.chunk,
            })
            .collect();

        // stable: equal distances keep insertion order
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn similarity(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}

/// Cosine distance, `1 - cos(a, b)`. Zero vectors are at distance 1.
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - similarity(a, l2_norm(a), b, l2_norm(b))
}
