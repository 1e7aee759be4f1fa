//! Per-key memoizing cache for asynchronously loaded metadata
//!
//! Resolved values live in an ArcSwap map so cached reads never take a lock.
//! Fetch bookkeeping (in-flight fetch, last start time, generation) sits
//! behind a mutex that also serializes every write to the resolved map.
//!
//! Guarantees per canonical key:
//! - at most one loader call in flight, shared by every concurrent caller
//! - no new fetch within `min_interval` of the previous fetch start
//! - loader failures resolve to `T::default()`, never to an error
//!
//! A global call counter warns once `warn_after_calls` is exceeded and stops
//! all loader calls past `max_calls`. That breaker guards against callers
//! stuck in a refetch loop; fetches should be driven by explicit lifecycle
//! events (mount, channel change) rather than by rendering.

use crate::catalog::loader::{ResourceLoader, TriggerCatalogEntry};
use crate::config::CacheConfig;
use arc_swap::ArcSwap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Handle to a running fetch; clones all resolve to the same value
pub type SharedFetch<T> = Shared<BoxFuture<'static, Arc<T>>>;

/// Trigger catalog cache keyed by channel
pub type TriggerCatalog = ResourceCache<Vec<TriggerCatalogEntry>>;

/// Outcome of a synchronous cache lookup
pub enum CacheLookup<T> {
    /// Cached value, or the empty value when fetching is not allowed right now
    Ready(Arc<T>),
    /// A fetch is running for this key
    Pending(SharedFetch<T>),
}

impl<T> CacheLookup<T> {
    pub async fn resolve(self) -> Arc<T> {
        match self {
            CacheLookup::Ready(value) => value,
            CacheLookup::Pending(fetch) => fetch.await,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CacheLookup::Pending(_))
    }
}

/// Maps caller-supplied keys onto canonical cache keys
///
/// Keys are trimmed and lowercased, then resolved through the alias table.
#[derive(Debug, Clone, Default)]
pub struct KeyNormalizer {
    aliases: HashMap<String, String>,
}

impl KeyNormalizer {
    pub fn new(aliases: &HashMap<String, String>) -> Self {
        let aliases = aliases
            .iter()
            .map(|(alias, canonical)| (alias.trim().to_lowercase(), canonical.trim().to_lowercase()))
            .collect();
        Self { aliases }
    }

    pub fn normalize(&self, key: &str) -> String {
        let key = key.trim().to_lowercase();
        match self.aliases.get(&key) {
            Some(canonical) => canonical.clone(),
            None => key,
        }
    }
}

/// Fetch bookkeeping for one key
struct EntryState<T> {
    in_flight: Option<SharedFetch<T>>,
    last_fetch_started_at: Option<Instant>,
    /// Bumped on invalidation so fetches started earlier cannot repopulate
    generation: u64,
}

impl<T> EntryState<T> {
    fn new() -> Self {
        Self {
            in_flight: None,
            last_fetch_started_at: None,
            generation: 0,
        }
    }
}

struct CacheInner<T> {
    resolved: ArcSwap<HashMap<String, Arc<T>>>,
    entries: Mutex<HashMap<String, EntryState<T>>>,
    calls: AtomicU64,
    tripped: AtomicBool,
}

impl<T: Default> CacheInner<T> {
    /// Record the outcome of a fetch started under `generation`
    fn settle(&self, key: &str, generation: u64, result: anyhow::Result<T>) -> Arc<T> {
        let mut entries = self.entries.lock();
        let current = entries.get(key).is_some_and(|entry| entry.generation == generation);

        let value = match result {
            Ok(value) => {
                let value = Arc::new(value);
                if current {
                    let resolved = self.resolved.load();
                    let mut next = (**resolved).clone();
                    next.insert(key.to_string(), Arc::clone(&value));
                    self.resolved.store(Arc::new(next));
                    tracing::debug!("✅ Cached value for '{}'", key);
                } else {
                    tracing::debug!("⏭️ Discarding fetch for '{}' invalidated while in flight", key);
                }
                value
            }
            Err(e) => {
                tracing::warn!("⚠️ Loader failed for '{}', serving empty result: {:#}", key, e);
                Arc::new(T::default())
            }
        };

        if current {
            if let Some(entry) = entries.get_mut(key) {
                entry.in_flight = None;
            }
        }
        value
    }
}

/// Single-flight, rate-limited, loop-guarded async cache
pub struct ResourceCache<T> {
    inner: Arc<CacheInner<T>>,
    loader: Arc<dyn ResourceLoader<T>>,
    normalizer: KeyNormalizer,
    min_interval: Duration,
    warn_after_calls: u64,
    max_calls: u64,
}

impl<T> Clone for ResourceCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            loader: Arc::clone(&self.loader),
            normalizer: self.normalizer.clone(),
            min_interval: self.min_interval,
            warn_after_calls: self.warn_after_calls,
            max_calls: self.max_calls,
        }
    }
}

impl<T> ResourceCache<T>
where
    T: Default + Send + Sync + 'static,
{
    pub fn new(config: &CacheConfig, loader: impl ResourceLoader<T> + 'static) -> Self {
        Self::with_shared_loader(config, Arc::new(loader))
    }

    pub fn with_shared_loader(config: &CacheConfig, loader: Arc<dyn ResourceLoader<T>>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                resolved: ArcSwap::new(Arc::new(HashMap::new())),
                entries: Mutex::new(HashMap::new()),
                calls: AtomicU64::new(0),
                tripped: AtomicBool::new(false),
            }),
            loader,
            normalizer: KeyNormalizer::new(&config.aliases),
            min_interval: config.min_interval,
            warn_after_calls: config.warn_after_calls,
            max_calls: config.max_calls,
        }
    }

    /// Get the value for `key`, fetching it if needed
    ///
    /// Never fails. Loader errors, rate limiting and the call breaker all
    /// yield the cached value if there is one, `T::default()` otherwise.
    pub async fn get(&self, key: &str) -> Arc<T> {
        let lookup = self.request(key);
        if lookup.is_pending() {
            tracing::debug!("⏳ Waiting on catalog fetch for '{}'", self.normalize(key));
        }
        lookup.resolve().await
    }

    /// Synchronous front half of `get`
    ///
    /// Returns the cached value, joins the running fetch, or starts one. Must
    /// be called within a tokio runtime since new fetches are spawned as
    /// tasks; a caller dropping the returned handle does not cancel the fetch.
    pub fn request(&self, key: &str) -> CacheLookup<T> {
        let key = self.normalizer.normalize(key);
        let calls = self.inner.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if calls == self.warn_after_calls.saturating_add(1) {
            tracing::warn!(
                "⚠️ Resource cache received {} calls; a caller may be refetching in a loop",
                calls
            );
        }

        if let Some(value) = self.inner.resolved.load().get(&key) {
            return CacheLookup::Ready(Arc::clone(value));
        }

        if calls > self.max_calls {
            if !self.inner.tripped.swap(true, Ordering::SeqCst) {
                tracing::error!(
                    "🛑 Resource cache exceeded {} calls; loader disabled for the rest of this process",
                    self.max_calls
                );
            }
            return CacheLookup::Ready(Arc::new(T::default()));
        }

        let mut entries = self.inner.entries.lock();

        // A fetch may have settled between the lock-free read and the lock
        if let Some(value) = self.inner.resolved.load().get(&key) {
            return CacheLookup::Ready(Arc::clone(value));
        }

        let entry = entries.entry(key.clone()).or_insert_with(EntryState::new);
        if let Some(fetch) = &entry.in_flight {
            return CacheLookup::Pending(fetch.clone());
        }

        let now = Instant::now();
        if let Some(started) = entry.last_fetch_started_at {
            if now.duration_since(started) < self.min_interval {
                tracing::debug!("⏳ Rate limited fetch for '{}'", key);
                return CacheLookup::Ready(Arc::new(T::default()));
            }
        }

        entry.last_fetch_started_at = Some(now);
        let fetch = self.spawn_fetch(key.clone(), entry.generation);
        entry.in_flight = Some(fetch.clone());

        tracing::debug!("🚀 Started fetch for '{}'", key);
        CacheLookup::Pending(fetch)
    }

    fn spawn_fetch(&self, key: String, generation: u64) -> SharedFetch<T> {
        let inner = Arc::clone(&self.inner);
        let loader = Arc::clone(&self.loader);

        let handle = tokio::spawn(async move {
            let result = loader.load(&key).await;
            inner.settle(&key, generation, result)
        });

        handle
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    tracing::warn!("⚠️ Fetch task failed, serving empty result: {}", e);
                    Arc::new(T::default())
                })
            })
            .boxed()
            .shared()
    }

    /// Resolved value for `key`, without side effects
    pub fn get_cached(&self, key: &str) -> Option<Arc<T>> {
        let key = self.normalizer.normalize(key);
        self.inner.resolved.load().get(&key).cloned()
    }

    /// Forget everything about `key`, including a fetch still in flight
    pub fn invalidate(&self, key: &str) {
        let key = self.normalizer.normalize(key);
        let mut entries = self.inner.entries.lock();

        if let Some(entry) = entries.get_mut(&key) {
            entry.generation += 1;
            entry.in_flight = None;
            entry.last_fetch_started_at = None;
        }

        let resolved = self.inner.resolved.load();
        if resolved.contains_key(&key) {
            let mut next = (**resolved).clone();
            next.remove(&key);
            self.inner.resolved.store(Arc::new(next));
        }
        tracing::debug!("🧹 Invalidated '{}'", key);
    }

    pub fn invalidate_all(&self) {
        let mut entries = self.inner.entries.lock();
        for entry in entries.values_mut() {
            entry.generation += 1;
            entry.in_flight = None;
            entry.last_fetch_started_at = None;
        }
        self.inner.resolved.store(Arc::new(HashMap::new()));
        tracing::debug!("🧹 Invalidated all {} cache keys", entries.len());
    }

    /// Canonical form of `key`
    pub fn normalize(&self, key: &str) -> String {
        self.normalizer.normalize(key)
    }

    /// Total `get`/`request` calls so far
    pub fn calls(&self) -> u64 {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// Whether the call breaker has disabled the loader
    pub fn is_tripped(&self) -> bool {
        self.inner.tripped.load(Ordering::SeqCst)
    }
}
