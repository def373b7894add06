use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::Config;
use crate::llm_client::{LlmClient, Oracle};
use crate::matching::jd::{JdCache, JdFetcher};
use crate::profile::store::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// `None` when no credential is configured.
    pub oracle: Option<Arc<dyn Oracle>>,
    pub store: ProfileStore,
    pub jd_fetcher: JdFetcher,
    pub jd_cache: Arc<JdCache>,
}

impl AppState {
    /// Builds the state from configuration, wiring the OpenAI client when a key is present.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let oracle = match &config.openai_api_key {
            Some(key) => {
                let client = LlmClient::new(
                    key.clone(),
                    config.openai_model.clone(),
                    config.openai_base_url.clone(),
                )?;
                info!("Oracle client initialized (model: {})", client.model());
                let client: Arc<dyn Oracle> = Arc::new(client);
                Some(client)
            }
            None => None,
        };
        Self::new(config, oracle)
    }

    pub fn new(config: Config, oracle: Option<Arc<dyn Oracle>>) -> anyhow::Result<Self> {
        Ok(Self {
            store: ProfileStore::new(config.profile_path.clone()),
            jd_fetcher: JdFetcher::new()?,
            jd_cache: Arc::new(JdCache::new(Duration::from_secs(config.jd_cache_ttl_secs))),
            oracle,
            config,
        })
    }

    pub fn oracle(&self) -> Option<&dyn Oracle> {
        self.oracle.as_deref()
    }
}
