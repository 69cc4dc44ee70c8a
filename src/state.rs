use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::{Config, LlmConfig};
use crate::search::rank::Ranker;
use crate::store::BlockStore;

/// Shared application state: one loaded block store for the server's lifetime.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<BlockStore>,
    pub http_client: reqwest::Client,
    pub llm_config: Arc<RwLock<LlmConfig>>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store = BlockStore::load(&config.index_path)?;
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: BlockStore) -> anyhow::Result<Self> {
        let llm_config = config.llm.clone();

        Ok(Self {
            config,
            store: Arc::new(store),
            http_client: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()?,
            llm_config: Arc::new(RwLock::new(llm_config)),
        })
    }

    /// Ranker reflecting the current embedding settings.
    pub fn ranker(&self) -> Ranker {
        let llm_config = self.llm_config.read().clone();
        Ranker::from_config(
            self.config.repository_root.clone(),
            &llm_config,
            self.http_client.clone(),
        )
    }
}
