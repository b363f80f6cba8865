mod env;
mod types;


pub use types::*;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use shredder_index::extractor::ExtractorConfig;
use shredder_index::languages::{FileRules, Lang, normalize_extension};
use shredder_index::{IndexerConfig, RetrievalConfig};
use shredder_llm::http::HttpTimeouts;
use shredder_llm::ollama::OllamaConfig;

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to sensible defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the resulting configuration fails [`Config::validate`].
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending key.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.application.workers == 0 {
            bail!("application.workers must be at least 1");
        }
        if self.embedding.concurrency == 0 {
            bail!("embedding.concurrency must be at least 1");
        }
        if self.retrieval.top_k == 0 {
            bail!("retrieval.top_k must be at least 1");
        }
        if let Some(ext) = self
            .application
            .structured_extensions
            .iter()
            .find(|e| Lang::from_extension(&normalize_extension(e)).is_none())
        {
            bail!("application.structured_extensions: no parser for {ext:?} (Python only)");
        }
        if self.llm.base_url.trim().is_empty() {
            bail!("llm.base_url must not be empty");
        }
        if self.llm.embedding_model.trim().is_empty() {
            bail!("llm.embedding_model must not be empty");
        }
        if self.llm.chat_model.trim().is_empty() {
            bail!("llm.chat_model must not be empty");
        }
        Ok(())
    }

    #[must_use]
    pub fn codebase_root(&self) -> PathBuf {
        PathBuf::from(&self.application.codebase_path)
    }

    #[must_use]
    pub fn ollama_config(&self) -> OllamaConfig {
        OllamaConfig {
            base_url: self.llm.base_url.clone(),
            chat_model: self.llm.chat_model.clone(),
            embedding_model: self.llm.embedding_model.clone(),
            timeouts: HttpTimeouts {
                connect: Duration::from_secs(self.llm.connect_timeout_secs),
                request: Duration::from_secs(self.llm.request_timeout_secs),
            },
            max_retries: self.llm.max_retries,
        }
    }

    #[must_use]
    pub fn indexer_config(&self) -> IndexerConfig {
        let app = &self.application;
        IndexerConfig {
            extractor: ExtractorConfig {
                rules: FileRules::new(&app.structured_extensions, &app.ignored_extensions),
                ignored_paths: app.ignored_paths.clone(),
                workers: app.workers,
                follow_links: app.follow_links,
            },
            embedding_concurrency: self.embedding.concurrency,
        }
    }

    #[must_use]
    pub fn retrieval_config(&self) -> RetrievalConfig {
        RetrievalConfig {
            top_k: self.retrieval.top_k,
            timeout: (self.retrieval.timeout_secs > 0)
                .then(|| Duration::from_secs(self.retrieval.timeout_secs)),
            ..RetrievalConfig::default()
        }
    }
}
