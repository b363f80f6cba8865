//! Declaration-level code chunking, embedding and in-memory retrieval.
//!
//! Python files are parsed with tree-sitter into a declaration tree and split
//! into one chunk per function and class plus one chunk for the whole module;
//! every other text file becomes a single chunk. Chunks are embedded through
//! an [`LlmProvider`](shredder_llm::LlmProvider), held in a brute-force cosine
//! index, and retrieved as context for a chat model.

pub mod chunk;
pub mod chunker;
pub mod decl;
pub mod embedder;
pub mod error;
pub mod extractor;
pub mod indexer;
pub mod languages;
pub(crate) mod python;
pub mod retriever;
pub mod vector_index;

pub use chunk::{Chunk, ChunkKind};
pub use error::{IndexError, Result};
pub use indexer::{CodeIndexer, IndexReport, IndexerConfig, ProjectIndex};
pub use retriever::{Answer, RetrievalConfig, RetrievalError, Retriever};
pub use vector_index::{SearchHit, SimilaritySearch, VectorIndex};
