use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SHREDDER_CODEBASE_PATH") {
            self.application.codebase_path = v;
        }
        if let Ok(v) = std::env::var("SHREDDER_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("SHREDDER_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("SHREDDER_LLM_CHAT_MODEL") {
            self.llm.chat_model = v;
        }
        if let Ok(v) = std::env::var("SHREDDER_WORKERS") {
            if let Ok(n) = v.parse::<usize>() {
                self.application.workers = n;
            } else {
                tracing::warn!("ignoring invalid SHREDDER_WORKERS value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SHREDDER_EMBEDDING_CONCURRENCY") {
            if let Ok(n) = v.parse::<usize>() {
                self.embedding.concurrency = n;
            } else {
                tracing::warn!("ignoring invalid SHREDDER_EMBEDDING_CONCURRENCY value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SHREDDER_RETRIEVAL_TOP_K") {
            if let Ok(k) = v.parse::<usize>() {
                self.retrieval.top_k = k;
            } else {
                tracing::warn!("ignoring invalid SHREDDER_RETRIEVAL_TOP_K value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SHREDDER_RETRIEVAL_TIMEOUT") {
            if let Ok(secs) = v.parse::<u64>() {
                self.retrieval.timeout_secs = secs;
            } else {
                tracing::warn!("ignoring invalid SHREDDER_RETRIEVAL_TIMEOUT value: {v}");
            }
        }
    }
}
