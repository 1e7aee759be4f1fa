//! Metadata loaders feeding the resource cache
//!
//! A loader fetches the value for one canonical key. It may fail freely;
//! the cache turns failures into empty results.

use crate::config::CatalogConfig;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Fetches the value stored under a cache key
#[async_trait]
pub trait ResourceLoader<T>: Send + Sync {
    async fn load(&self, key: &str) -> Result<T>;
}

/// Adapter turning an async closure into a `ResourceLoader`
pub struct FnLoader<F>(F);

/// Wrap `f(key)` as a loader
pub fn loader_fn<F>(f: F) -> FnLoader<F> {
    FnLoader(f)
}

#[async_trait]
impl<T, F, Fut> ResourceLoader<T> for FnLoader<F>
where
    T: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T>> + Send,
{
    async fn load(&self, key: &str) -> Result<T> {
        (self.0)(key.to_string()).await
    }
}

/// One trigger subtype offered for a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerCatalogEntry {
    /// Trigger subtype, e.g. "keyword_dm"
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
}

/// Accepted response bodies: a bare list or `{"triggers": [...]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogPayload {
    List(Vec<TriggerCatalogEntry>),
    Envelope { triggers: Vec<TriggerCatalogEntry> },
}

impl CatalogPayload {
    fn into_entries(self) -> Vec<TriggerCatalogEntry> {
        match self {
            CatalogPayload::List(entries) => entries,
            CatalogPayload::Envelope { triggers } => triggers,
        }
    }
}

/// Loads a channel's trigger catalog over HTTP
///
/// GET {base_url}/api/triggers/{channel}
#[derive(Debug, Clone)]
pub struct HttpCatalogLoader {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogLoader {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build catalog HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::new(&CatalogConfig {
            base_url: base_url.into(),
            timeout_secs: timeout.as_secs().max(1),
        })
    }

    pub fn endpoint(&self, channel: &str) -> String {
        format!("{}/api/triggers/{}", self.base_url, channel)
    }
}

#[async_trait]
impl ResourceLoader<Vec<TriggerCatalogEntry>> for HttpCatalogLoader {
    async fn load(&self, channel: &str) -> Result<Vec<TriggerCatalogEntry>> {
        let url = self.endpoint(channel);
        tracing::debug!("🌐 Fetching trigger catalog: {}", url);

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let payload: CatalogPayload = response.json().await?;
        let entries = payload.into_entries();

        tracing::info!("📥 Loaded {} triggers for channel '{}'", entries.len(), channel);
        Ok(entries)
    }
}
