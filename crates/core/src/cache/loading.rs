//! Loading cache built on Moka.
//!
//! A [`LoadingCache`] pairs a bounded Moka cache with an authoritative loader.
//! A miss on [`get`](LoadingCache::get) runs the loader exactly once per key no
//! matter how many callers arrive while it is in flight; all of them receive
//! the same result. Failed loads leave the key absent so the next `get` retries.

use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use tracing::{debug, warn};

use super::error::LoadError;
use crate::ledger::StoreError;

type LoaderFn<K, V> = dyn Fn(K) -> BoxFuture<'static, Result<V, StoreError>> + Send + Sync;

/// Sizing, expiry and deadline settings for a [`LoadingCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries before least-recently-used eviction.
    pub max_size: u64,
    /// Entries older than this since their last write are treated as absent.
    pub expire_after_write: Option<Duration>,
    /// Deadline for a single loader invocation.
    pub load_timeout: Option<Duration>,
}

impl CacheConfig {
    /// Creates a size-bounded configuration with no expiry and no deadline.
    #[must_use]
    pub const fn new(max_size: u64) -> Self {
        Self {
            max_size,
            expire_after_write: None,
            load_timeout: None,
        }
    }

    /// Sets the expire-after-write duration.
    #[must_use]
    pub const fn with_expiry(mut self, ttl: Duration) -> Self {
        self.expire_after_write = Some(ttl);
        self
    }

    /// Sets the loader deadline.
    #[must_use]
    pub const fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = Some(timeout);
        self
    }
}

/// Bounded cache that populates misses from an authoritative loader.
///
/// Values are returned by clone; wrap large values in `Arc`.
pub struct LoadingCache<K, V> {
    name: &'static str,
    cache: Cache<K, V>,
    loader: Arc<LoaderFn<K, V>>,
    load_timeout: Option<Duration>,
}

impl<K, V> Clone for LoadingCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            cache: self.cache.clone(),
            loader: Arc::clone(&self.loader),
            load_timeout: self.load_timeout,
        }
    }
}

impl<K, V> LoadingCache<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache named `name` (used in logs) backed by `loader`.
    pub fn new<F, Fut>(name: &'static str, config: CacheConfig, loader: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, StoreError>> + Send + 'static,
    {
        let mut builder = Cache::builder()
            .name(name)
            .max_capacity(config.max_size)
            .eviction_policy(EvictionPolicy::lru());
        if let Some(ttl) = config.expire_after_write {
            builder = builder.time_to_live(ttl);
        }

        let loader: Arc<LoaderFn<K, V>> = Arc::new(move |key| loader(key).boxed());

        Self {
            name,
            cache: builder.build(),
            loader,
            load_timeout: config.load_timeout,
        }
    }

    /// Returns the cached value, loading it on a miss.
    ///
    /// Concurrent callers for the same absent key share one loader
    /// invocation and all observe its outcome.
    pub async fn get(&self, key: &K) -> Result<V, LoadError> {
        let loader = Arc::clone(&self.loader);
        let load_timeout = self.load_timeout;
        let name = self.name;
        let owned = key.clone();

        let init = async move {
            debug!(cache = name, key = ?owned, "cache miss, running loader");
            let load = loader(owned.clone());
            let result = match load_timeout {
                Some(limit) => match tokio::time::timeout(limit, load).await {
                    Ok(result) => result.map_err(LoadError::from),
                    Err(_) => Err(LoadError::Timeout(limit)),
                },
                None => load.await.map_err(LoadError::from),
            };
            if let Err(err) = &result {
                warn!(cache = name, key = ?owned, error = %err, "authoritative load failed");
            }
            result
        };

        self.cache
            .try_get_with(key.clone(), init)
            .await
            .map_err(|err: Arc<LoadError>| LoadError::clone(&err))
    }

    /// Returns the value if it is present. Never loads and never waits on an
    /// in-flight load.
    pub async fn get_if_present(&self, key: &K) -> Option<V> {
        self.cache.get(key).await
    }

    /// Stores `value` for `key`, replacing whatever is there.
    pub async fn put(&self, key: K, value: V) {
        self.cache.insert(key, value).await;
    }

    /// Removes `key` so the next `get` reloads it.
    pub async fn invalidate(&self, key: &K) {
        self.cache.invalidate(key).await;
    }

    /// Removes every entry.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Approximate number of entries. Exact after [`run_pending_tasks`](Self::run_pending_tasks).
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Applies pending evictions and expirations immediately.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }

    /// Name given at construction.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}
