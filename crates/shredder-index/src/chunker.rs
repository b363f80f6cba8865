//! Structural and opaque chunking of a single file's content.

use crate::chunk::{Chunk, ChunkKind};
use crate::decl::{DeclKind, DeclNode, DeclVisitor, walk_breadth_first};
use crate::error::Result;
use crate::languages::Lang;
use crate::python;

/// Lines taken after the start line when a declaration has no end line.
pub const FALLBACK_SPAN_LINES: usize = 10;

/// Chunk a structured file: one `module` chunk for the whole file, then one
/// chunk per declaration in breadth-first order.
///
/// # Errors
///
/// Returns `IndexError::Parse` if the source is not syntactically valid.
/// Nothing is emitted for a file that fails to parse.
pub fn chunk_structured(
    source: &str,
    source_path: &str,
    file_name: &str,
    lang: Lang,
) -> Result<Vec<Chunk>> {
    let decls = match lang {
        Lang::Python => python::parse_declarations(source)?,
    };
    Ok(chunk_declarations(source, source_path, file_name, &decls))
}

/// Chunk pre-parsed declarations against their source.
#[must_use]
pub fn chunk_declarations(
    source: &str,
    source_path: &str,
    file_name: &str,
    decls: &[DeclNode],
) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> =
        Chunk::new(source_path, ChunkKind::Module, file_name, 1, source)
            .into_iter()
            .collect();

    let mut collector = SpanCollector {
        lines: source.split_inclusive('\n').collect(),
        source_path,
        chunks: &mut chunks,
    };
    walk_breadth_first(decls, &mut collector);
    chunks
}

/// Chunk an opaque file as a single `whole_file` chunk.
#[must_use]
pub fn chunk_opaque(source: &str, source_path: &str, file_name: &str) -> Vec<Chunk> {
    Chunk::new(source_path, ChunkKind::WholeFile, file_name, 1, source)
        .into_iter()
        .collect()
}

struct SpanCollector<'a> {
    lines: Vec<&'a str>,
    source_path: &'a str,
    chunks: &'a mut Vec<Chunk>,
}

impl DeclVisitor for SpanCollector<'_> {
    fn visit(&mut self, node: &DeclNode) {
        let kind = match node.kind {
            DeclKind::Function => ChunkKind::FunctionLike,
            DeclKind::Class => ChunkKind::ClassLike,
        };
        let text = slice_lines(&self.lines, node.start_line, node.end_line);
        if let Some(chunk) = Chunk::new(self.source_path, kind, &node.name, node.start_line, &text)
        {
            self.chunks.push(chunk);
        }
    }
}

/// Join 1-based lines `start..=end`, clamped to the file. Without an end
/// line the span is `start..=start + FALLBACK_SPAN_LINES`.
fn slice_lines(lines: &[&str], start: usize, end: Option<usize>) -> String {
    let from = start.saturating_sub(1).min(lines.len());
    let to = end
        .unwrap_or(start + FALLBACK_SPAN_LINES)
        .min(lines.len())
        .max(from);
    lines[from..to].concat()
}
