use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::search::rank::RankOptions;

/// Upper bound for a single embedding request.
const MAX_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Parsed index JSON produced by the external parser
    pub index_path: PathBuf,
    /// Repository checkout that block line ranges refer to
    pub repository_root: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Default ranking options
    pub rank: RankOptions,
    /// Embedding provider configuration
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "none", "ollama" or "openai"
    pub provider: String,
    /// Base URL for the embedding API
    pub base_url: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Texts per request; 1 sends one request per text
    pub batch_size: usize,
    /// Requests in flight at once
    pub concurrency: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./parsed_code.json"),
            repository_root: PathBuf::from("."),
            bind_addr: "127.0.0.1:9000".to_string(),
            rank: RankOptions::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "none".to_string(),
            base_url: "http://localhost:11434".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            api_key: None,
            batch_size: 1,
            concurrency: 1,
            timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    /// Whether an embedding provider has been configured at all.
    pub fn is_enabled(&self) -> bool {
        !matches!(self.provider.as_str(), "" | "none")
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("RETRIEVAL_INDEX_PATH") {
            config.index_path = PathBuf::from(path);
        }
        if let Ok(root) = std::env::var("RETRIEVAL_REPO_ROOT") {
            config.repository_root = PathBuf::from(root);
        }
        if let Ok(addr) = std::env::var("RETRIEVAL_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(name) = std::env::var("RETRIEVAL_STRATEGY") {
            match name.parse() {
                Ok(strategy) => config.rank.strategy = strategy,
                Err(e) => tracing::warn!("Ignoring RETRIEVAL_STRATEGY: {e}"),
            }
        }
        if let Ok(val) = std::env::var("RETRIEVAL_TOP_N") {
            if let Ok(v) = val.parse::<usize>() {
                if v > 0 {
                    config.rank.top_n = v;
                }
            }
        }
        if let Ok(val) = std::env::var("RETRIEVAL_SCORE_THRESHOLD") {
            if let Ok(v) = val.parse() {
                config.rank.score_threshold = Some(v);
            }
        }

        // Embedding provider
        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("EMBEDDING_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("EMBEDDING_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("EMBEDDING_BATCH_SIZE") {
            if let Ok(v) = val.parse::<usize>() {
                config.llm.batch_size = v.max(1);
            }
        }
        if let Ok(val) = std::env::var("EMBEDDING_CONCURRENCY") {
            if let Ok(v) = val.parse::<usize>() {
                config.llm.concurrency = v.max(1);
            }
        }
        if let Ok(val) = std::env::var("EMBEDDING_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.llm.timeout_secs = v.min(MAX_TIMEOUT_SECS);
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::Strategy;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.rank.strategy, Strategy::Bm25);
        assert_eq!(config.rank.top_n, 2);
        assert_eq!(config.rank.score_threshold, None);
        assert!(!config.llm.is_enabled());
        assert_eq!(config.llm.batch_size, 1);
    }

    #[test]
    fn test_provider_enabled() {
        let llm = LlmConfig {
            provider: "ollama".to_string(),
            ..LlmConfig::default()
        };
        assert!(llm.is_enabled());
    }
}
