//! The retrievable unit: a trimmed source slice with identifying metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a chunk covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    /// Entire non-structured file.
    WholeFile,
    /// Entire structured file, verbatim.
    Module,
    ClassLike,
    FunctionLike,
}

impl ChunkKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WholeFile => "whole_file",
            Self::Module => "module",
            Self::ClassLike => "class_like",
            Self::FunctionLike => "function_like",
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chunk of source text.
///
/// Serializes as `{source_path, kind, name, start_line, text, embedding?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub source_path: String,
    pub kind: ChunkKind,
    pub name: String,
    /// 1-based.
    pub start_line: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    /// Build a chunk from an untrimmed slice. Returns `None` when the slice is
    /// blank, so an empty chunk can never exist.
    #[must_use]
    pub fn new(
        source_path: impl Into<String>,
        kind: ChunkKind,
        name: impl Into<String>,
        start_line: usize,
        raw_text: &str,
    ) -> Option<Self> {
        let text = raw_text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            source_path: source_path.into(),
            kind,
            name: name.into(),
            start_line,
            text: text.to_owned(),
            embedding: None,
        })
    }

    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.embedding.is_some()
    }

    /// Short header for display: `path :: name (kind, line N)`.
    #[must_use]
    pub fn display_header(&self) -> String {
        format!(
            "{} :: {} ({}, line {})",
            self.source_path, self.name, self.kind, self.start_line
        )
    }
}
