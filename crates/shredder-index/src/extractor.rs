//! Directory walk → per-file chunking on a bounded worker pool.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::chunk::Chunk;
use crate::chunker::{chunk_opaque, chunk_structured};
use crate::error::{IndexError, Result};
use crate::languages::{FileClass, FileRules};

pub const DEFAULT_IGNORED_PATHS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    "node_modules",
    "target",
    ".venv",
    "venv",
    ".mypy_cache",
    ".pytest_cache",
];

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub rules: FileRules,
    /// Directory names pruned from the walk, compared case-insensitively.
    pub ignored_paths: Vec<String>,
    /// Files read and chunked concurrently.
    pub workers: usize,
    pub follow_links: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            rules: FileRules::default(),
            ignored_paths: DEFAULT_IGNORED_PATHS.iter().map(|p| (*p).to_owned()).collect(),
            workers: 4,
            follow_links: true,
        }
    }
}

/// A file that was visited but produced no chunks because it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: String,
    pub reason: String,
}

/// Result of one extraction pass.
#[derive(Debug, Default)]
pub struct Extraction {
    /// All chunks, in walk order.
    pub chunks: Vec<Chunk>,
    /// Files routed to a chunker.
    pub files_visited: usize,
    /// Files skipped by the extension denylist.
    pub files_skipped: usize,
    pub failures: Vec<FileFailure>,
    /// Walk-level problems (unreadable directory, symlink loop).
    pub walk_errors: Vec<String>,
}

/// A discovered file, ready to be chunked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub abs_path: PathBuf,
    /// Path relative to the walk root.
    pub rel_path: String,
    pub file_name: String,
    pub class: FileClass,
}

/// Walk `root` and chunk every eligible file.
///
/// Per-file failures are recorded in [`Extraction::failures`] and never abort
/// the walk.
///
/// # Errors
///
/// Returns `IndexError::RootNotFound` if `root` is missing or not a directory.
pub async fn extract(root: &Path, config: &ExtractorConfig) -> Result<Extraction> {
    let (files, walk_errors) = discover_files(root, config)?;
    let mut extraction = Extraction {
        walk_errors,
        ..Extraction::default()
    };

    let mut jobs = Vec::with_capacity(files.len());
    for file in files {
        if file.class == FileClass::Skipped {
            tracing::debug!(file = %file.rel_path, "skipped by extension");
            extraction.files_skipped += 1;
        } else {
            jobs.push(file);
        }
    }
    extraction.files_visited = jobs.len();
    tracing::info!(
        root = %root.display(),
        files = jobs.len(),
        skipped = extraction.files_skipped,
        workers = config.workers,
        "extraction started"
    );

    let mut outcomes: Vec<Option<Result<Vec<Chunk>>>> = Vec::new();
    outcomes.resize_with(jobs.len(), || None);

    let semaphore = Arc::new(Semaphore::new(config.workers.max(1)));
    let mut join_set = JoinSet::new();
    for (position, file) in jobs.iter().cloned().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (position, chunk_file(&file).await)
        });
    }

    while let Some(result) = join_set.join_next().await {
        let Ok((position, outcome)) = result else {
            tracing::warn!("extraction task panicked");
            continue;
        };
        outcomes[position] = Some(outcome);
    }

    for (file, outcome) in jobs.iter().zip(outcomes) {
        match outcome {
            Some(Ok(chunks)) => {
                tracing::debug!(file = %file.rel_path, chunks = chunks.len(), "chunked");
                extraction.chunks.extend(chunks);
            }
            Some(Err(e)) => {
                tracing::warn!(file = %file.rel_path, error = %e, "file skipped");
                extraction.failures.push(FileFailure {
                    path: file.rel_path.clone(),
                    reason: e.to_string(),
                });
            }
            None => extraction.failures.push(FileFailure {
                path: file.rel_path.clone(),
                reason: "extraction task aborted".into(),
            }),
        }
    }

    tracing::info!(
        chunks = extraction.chunks.len(),
        failed = extraction.failures.len(),
        "extraction finished"
    );
    Ok(extraction)
}

/// Read and chunk one file according to its class.
///
/// # Errors
///
/// Returns an error if the file cannot be read as UTF-8 or fails to parse.
pub async fn chunk_file(file: &SourceFile) -> Result<Vec<Chunk>> {
    let source = tokio::fs::read_to_string(&file.abs_path).await?;
    match file.class {
        FileClass::Structured(lang) => {
            chunk_structured(&source, &file.rel_path, &file.file_name, lang)
        }
        FileClass::Opaque => Ok(chunk_opaque(&source, &file.rel_path, &file.file_name)),
        FileClass::Skipped => Ok(Vec::new()),
    }
}

/// List files under `root` in sorted walk order, classified, with ignored
/// directories pruned and each canonical file kept once.
///
/// Returns the files and any walk errors that were skipped.
///
/// # Errors
///
/// Returns `IndexError::RootNotFound` if `root` is missing or not a directory.
pub fn discover_files(
    root: &Path,
    config: &ExtractorConfig,
) -> Result<(Vec<SourceFile>, Vec<String>)> {
    if !root.is_dir() {
        return Err(IndexError::RootNotFound(root.to_path_buf()));
    }

    let ignored: HashSet<String> = config
        .ignored_paths
        .iter()
        .map(|p| p.trim().to_lowercase())
        .collect();

    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(config.follow_links)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            entry.depth() == 0
                || !entry.file_type().is_some_and(|ft| ft.is_dir())
                || !ignored.contains(&entry.file_name().to_string_lossy().to_lowercase())
        })
        .build();

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut files = Vec::new();
    let mut errors = Vec::new();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "walk entry skipped");
                errors.push(e.to_string());
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let abs_path = entry.path().to_path_buf();
        let canonical = std::fs::canonicalize(&abs_path).unwrap_or_else(|_| abs_path.clone());
        if !seen.insert(canonical) {
            tracing::debug!(path = %abs_path.display(), "already visited via another path");
            continue;
        }

        let rel_path = abs_path
            .strip_prefix(root)
            .unwrap_or(&abs_path)
            .to_string_lossy()
            .to_string();
        let file_name = abs_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| rel_path.clone());
        let class = config.rules.classify(&abs_path);
        files.push(SourceFile {
            abs_path,
            rel_path,
            file_name,
            class,
        });
    }

    Ok((files, errors))
}
