//! # Detail Store
//!
//! Bounded, expiring product-id → detail cache with single-flight loading.
//!
//! Entries live in a Moka cache (LRU eviction, time-to-live and
//! time-to-idle). Misses go through an in-flight table: the first caller for
//! a key spawns the load on its own task and publishes a shared handle to it;
//! every concurrent caller for that key awaits the same handle. The load task
//! writes successful results into the cache *before* leaving the in-flight
//! table, so a caller never sees neither.

use crate::cache::errors::{CacheLoadError, CacheResult};
use crate::models::{ProductDetail, ProductId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

type LoadOutcome = CacheResult<Option<ProductDetail>>;
type SharedLoad = Shared<BoxFuture<'static, LoadOutcome>>;

/// Sizing and expiry for a [`DetailStore`]
///
/// `expire_after_access` only has an observable effect when it is shorter
/// than `expire_after_write`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailStoreConfig {
    /// Maximum number of live entries
    pub maximum_size: u64,
    /// Absolute lifetime of an entry, counted from insertion
    pub expire_after_write: Duration,
    /// Idle lifetime of an entry, counted from its last read
    pub expire_after_access: Duration,
}

impl Default for DetailStoreConfig {
    fn default() -> Self {
        Self {
            maximum_size: 1000,
            expire_after_write: Duration::from_secs(30 * 60),
            expire_after_access: Duration::from_secs(10 * 60),
        }
    }
}

/// Point-in-time store counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailStoreStats {
    pub hits: u64,
    pub misses: u64,
    pub loads_started: u64,
    pub load_successes: u64,
    pub load_not_found: u64,
    pub load_failures: u64,
    pub entry_count: u64,
}

impl DetailStoreStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }
        self.hits as f64 / lookups as f64
    }
}

#[derive(Debug, Default)]
struct StoreCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads_started: AtomicU64,
    load_successes: AtomicU64,
    load_not_found: AtomicU64,
    load_failures: AtomicU64,
}

struct StoreInner {
    entries: Cache<ProductId, ProductDetail>,
    in_flight: DashMap<ProductId, SharedLoad>,
    counters: StoreCounters,
    config: DetailStoreConfig,
}

/// Releases a key's in-flight slot when its load task ends, panics included
struct InFlightSlot {
    inner: Arc<StoreInner>,
    key: ProductId,
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.inner.in_flight.remove(&self.key);
    }
}

/// Process-wide cache of resolved product details
///
/// Cloning is cheap and every clone shares the same entries.
#[derive(Clone)]
pub struct DetailStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for DetailStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailStore")
            .field("maximum_size", &self.inner.config.maximum_size)
            .field("entry_count", &self.inner.entries.entry_count())
            .field("in_flight", &self.inner.in_flight.len())
            .finish()
    }
}

impl DetailStore {
    pub fn new(config: DetailStoreConfig) -> Self {
        if config.expire_after_access > config.expire_after_write {
            warn!(
                expire_after_write_ms = config.expire_after_write.as_millis(),
                expire_after_access_ms = config.expire_after_access.as_millis(),
                "expire_after_access exceeds expire_after_write and will never take effect"
            );
        }

        let entries = Cache::builder()
            .max_capacity(config.maximum_size)
            .time_to_live(config.expire_after_write)
            .time_to_idle(config.expire_after_access)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        info!(
            maximum_size = config.maximum_size,
            expire_after_write_ms = config.expire_after_write.as_millis(),
            expire_after_access_ms = config.expire_after_access.as_millis(),
            "Detail store created"
        );

        Self {
            inner: Arc::new(StoreInner {
                entries,
                in_flight: DashMap::new(),
                counters: StoreCounters::default(),
                config,
            }),
        }
    }

    pub fn config(&self) -> &DetailStoreConfig {
        &self.inner.config
    }

    /// Return the cached detail for `id`, loading it with `loader` on a miss
    ///
    /// `loader` runs at most once per key at a time; concurrent callers for
    /// the same key await that single load. `Ok(None)` and errors from the
    /// loader are passed through and never cached.
    pub async fn get<F, Fut, E>(&self, id: &ProductId, loader: F) -> CacheResult<Option<ProductDetail>>
    where
        F: FnOnce(ProductId) -> Fut,
        Fut: Future<Output = Result<Option<ProductDetail>, E>> + Send + 'static,
        E: StdError + Send + Sync + 'static,
    {
        if let Some(detail) = self.lookup(id) {
            return Ok(Some(detail));
        }

        let load = match self.inner.in_flight.entry(id.clone()) {
            Entry::Occupied(flight) => {
                self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!(product_id = %id, "Joining in-flight load");
                flight.get().clone()
            }
            Entry::Vacant(slot) => {
                // The previous load may have finished since the first lookup
                if let Some(detail) = self.lookup(id) {
                    return Ok(Some(detail));
                }
                self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
                let load = self.start_load(id.clone(), loader(id.clone()));
                slot.insert(load.clone());
                load
            }
        };

        load.await
    }

    fn lookup(&self, id: &ProductId) -> Option<ProductDetail> {
        let detail = self.inner.entries.get(id)?;
        self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
        debug!(product_id = %id, "Detail store HIT");
        Some(detail)
    }

    fn start_load<Fut, E>(&self, key: ProductId, load: Fut) -> SharedLoad
    where
        Fut: Future<Output = Result<Option<ProductDetail>, E>> + Send + 'static,
        E: StdError + Send + Sync + 'static,
    {
        self.inner
            .counters
            .loads_started
            .fetch_add(1, Ordering::Relaxed);
        debug!(product_id = %key, "Detail store MISS, starting load");

        let slot = InFlightSlot {
            inner: Arc::clone(&self.inner),
            key: key.clone(),
        };
        let handle = tokio::spawn(async move {
            let inner = Arc::clone(&slot.inner);
            let key = slot.key.clone();
            let outcome = match load.await {
                Ok(Some(detail)) => {
                    inner.entries.insert(key.clone(), detail.clone());
                    inner
                        .counters
                        .load_successes
                        .fetch_add(1, Ordering::Relaxed);
                    Ok(Some(detail))
                }
                Ok(None) => {
                    inner
                        .counters
                        .load_not_found
                        .fetch_add(1, Ordering::Relaxed);
                    debug!(product_id = %key, "Load found nothing, not caching");
                    Ok(None)
                }
                Err(error) => {
                    inner
                        .counters
                        .load_failures
                        .fetch_add(1, Ordering::Relaxed);
                    debug!(product_id = %key, error = %error, "Load failed, not caching");
                    Err(CacheLoadError::loader_failed(&key, error))
                }
            };
            drop(slot);
            outcome
        });

        async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    warn!(product_id = %key, error = %join_error, "Detail load task aborted");
                    Err(CacheLoadError::Aborted {
                        key,
                        reason: join_error.to_string(),
                    })
                }
            }
        }
        .boxed()
        .shared()
    }

    pub fn invalidate(&self, id: &ProductId) {
        self.inner.entries.invalidate(id);
    }

    pub fn invalidate_all(&self) {
        self.inner.entries.invalidate_all();
    }

    /// Approximate number of live entries
    pub fn entry_count(&self) -> u64 {
        self.inner.entries.entry_count()
    }

    /// Apply pending evictions and expirations now
    pub fn run_pending_tasks(&self) {
        self.inner.entries.run_pending_tasks();
    }

    pub fn stats(&self) -> DetailStoreStats {
        let counters = &self.inner.counters;
        DetailStoreStats {
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            loads_started: counters.loads_started.load(Ordering::Relaxed),
            load_successes: counters.load_successes.load(Ordering::Relaxed),
            load_not_found: counters.load_not_found.load(Ordering::Relaxed),
            load_failures: counters.load_failures.load(Ordering::Relaxed),
            entry_count: self.inner.entries.entry_count(),
        }
    }
}
