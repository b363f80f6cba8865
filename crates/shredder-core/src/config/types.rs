use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub application: ApplicationConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_codebase_path() -> String {
    "codebase".into()
}

fn default_ignored_paths() -> Vec<String> {
    shredder_index::extractor::DEFAULT_IGNORED_PATHS
        .iter()
        .map(|p| (*p).to_owned())
        .collect()
}

fn default_ignored_extensions() -> Vec<String> {
    shredder_index::languages::DEFAULT_IGNORED_EXTENSIONS
        .iter()
        .map(|e| format!(".{e}"))
        .collect()
}

fn default_structured_extensions() -> Vec<String> {
    shredder_index::languages::DEFAULT_STRUCTURED_EXTENSIONS
        .iter()
        .map(|e| format!(".{e}"))
        .collect()
}

fn default_workers() -> usize {
    4
}

fn default_true() -> bool {
    true
}

/// Walk root and file discovery rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_codebase_path")]
    pub codebase_path: String,
    #[serde(default = "default_ignored_paths")]
    pub ignored_paths: Vec<String>,
    #[serde(default = "default_ignored_extensions")]
    pub ignored_extensions: Vec<String>,
    /// Extensions parsed as Python. Anything else belongs in neither list and
    /// is chunked whole.
    #[serde(default = "default_structured_extensions")]
    pub structured_extensions: Vec<String>,
    /// Extraction worker pool size.
    #[serde(default = "default_workers", alias = "num_threads")]
    pub workers: usize,
    #[serde(default = "default_true")]
    pub follow_links: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            codebase_path: default_codebase_path(),
            ignored_paths: default_ignored_paths(),
            ignored_extensions: default_ignored_extensions(),
            structured_extensions: default_structured_extensions(),
            workers: default_workers(),
            follow_links: true,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".into()
}

fn default_chat_model() -> String {
    "qwen2.5-coder:7b".into()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    2
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Retries on HTTP 429.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_concurrency() -> usize {
    8
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_top_k() -> usize {
    10
}

fn default_retrieval_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetrievalSettings {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Whole-query deadline; 0 disables it.
    #[serde(default = "default_retrieval_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            timeout_secs: default_retrieval_timeout_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
