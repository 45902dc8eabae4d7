//! Capacity- and TTL-bounded cache that computes misses through a loader.
//!
//! * concurrent misses on one key share a single loader run;
//! * an entry older than `refresh_after` is served as-is while one
//!   background reload replaces it, unless the entry was reloaded or
//!   evicted in the meantime;
//! * failed loads are never stored.

use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use moka::policy::EvictionPolicy;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::CacheSettings;
use crate::error::GatewayError;

/// Computes the value for a missing key.
#[async_trait]
pub trait CacheLoader<K, V>: Send + Sync + 'static {
    async fn load(&self, key: &K) -> Result<V, GatewayError>;
}

#[derive(Debug)]
struct Stamped<V> {
    value: V,
    loaded_at: Instant,
}

impl<V> Stamped<V> {
    fn new(value: V) -> Arc<Self> {
        Arc::new(Self {
            value,
            loaded_at: Instant::now(),
        })
    }
}

pub struct LoadingCache<K, V, L> {
    name: Arc<str>,
    entries: Cache<K, Arc<Stamped<V>>>,
    loader: Arc<L>,
    refresh_after: Option<Duration>,
    /// Keys with a background reload in flight.
    refreshing: Arc<DashMap<K, ()>>,
}

impl<K, V, L> Clone for LoadingCache<K, V, L>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            entries: self.entries.clone(),
            loader: Arc::clone(&self.loader),
            refresh_after: self.refresh_after,
            refreshing: Arc::clone(&self.refreshing),
        }
    }
}

impl<K, V, L> LoadingCache<K, V, L>
where
    K: Hash + Eq + Clone + Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    L: CacheLoader<K, V>,
{
    pub fn new(name: &str, settings: CacheSettings, loader: L) -> Self {
        let entries = Cache::builder()
            .name(name)
            .max_capacity(settings.capacity)
            .time_to_live(settings.ttl)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self {
            name: Arc::from(name),
            entries,
            loader: Arc::new(loader),
            refresh_after: settings.refresh_after(),
            refreshing: Arc::new(DashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cached value for `key`, loading it on a miss.
    pub async fn get(&self, key: &K) -> Result<V, GatewayError> {
        if let Some(entry) = self.entries.get(key).await {
            self.refresh_if_due(key, &entry);
            return Ok(entry.value.clone());
        }

        log::debug!("{}: miss {key}", self.name);
        let loader = Arc::clone(&self.loader);
        let entry = self
            .entries
            .try_get_with(key.clone(), async move { loader.load(key).await.map(Stamped::new) })
            .await
            .map_err(|e| (*e).clone())?;
        Ok(entry.value.clone())
    }

    /// Cached value without loading or refreshing.
    pub async fn peek(&self, key: &K) -> Option<V> {
        self.entries.get(key).await.map(|e| e.value.clone())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_refreshing(&self, key: &K) -> bool {
        self.refreshing.contains_key(key)
    }

    /// Drop every entry. Loads already in flight still complete.
    pub async fn invalidate_all(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks().await;
    }

    /// Apply pending evictions and expirations now.
    pub async fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks().await;
    }

    /// Approximate number of resident entries.
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    fn refresh_if_due(&self, key: &K, entry: &Arc<Stamped<V>>) {
        let Some(after) = self.refresh_after else {
            return;
        };
        if entry.loaded_at.elapsed() < after {
            return;
        }
        // One reload per key at a time.
        if self.refreshing.insert(key.clone(), ()).is_some() {
            return;
        }

        let key = key.clone();
        let name = Arc::clone(&self.name);
        let entries = self.entries.clone();
        let loader = Arc::clone(&self.loader);
        let replacing = Arc::clone(entry);
        let guard = RefreshGuard {
            key: key.clone(),
            refreshing: Arc::clone(&self.refreshing),
        };

        log::debug!("{name}: refreshing {key}");
        tokio::spawn(async move {
            let _guard = guard;
            let value = match loader.load(&key).await {
                Ok(value) => value,
                // The stale value stays until its TTL runs out.
                Err(e) => {
                    log::warn!("{name}: refresh of {key} failed: {e}");
                    return;
                }
            };

            // Install only over the entry this reload was started for.
            let fresh = Stamped::new(value);
            let result = entries
                .entry(key.clone())
                .and_compute_with(|current| {
                    let op = match current {
                        Some(current) if Arc::ptr_eq(current.value(), &replacing) => Op::Put(fresh),
                        _ => Op::Nop,
                    };
                    std::future::ready(op)
                })
                .await;
            if !matches!(result, CompResult::ReplacedWith(_)) {
                log::debug!("{name}: dropped refresh of {key}, entry changed meanwhile");
            }
        });
    }
}

/// Clears the in-flight mark of a refresh however its task ends.
struct RefreshGuard<K: Hash + Eq> {
    key: K,
    refreshing: Arc<DashMap<K, ()>>,
}

impl<K: Hash + Eq> Drop for RefreshGuard<K> {
    fn drop(&mut self) {
        self.refreshing.remove(&self.key);
    }
}
