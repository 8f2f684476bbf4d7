//! Cached reads with a staleness window and prefix invalidation.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use moka::future::Cache;
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

use crate::config::QueryConfig;

use super::key::QueryKey;

const EVENT_CAPACITY: usize = 64;

/// Lifecycle of a single query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueryStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

/// Published whenever cached data changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEvent {
    /// Every entry under this prefix was marked stale.
    Invalidated(QueryKey),
    /// Fresh data was stored for this key.
    Updated(QueryKey),
}

#[derive(Clone)]
struct CachedEntry {
    data: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
    /// Invalidation generation observed before the data was requested.
    generation: u64,
}

/// Invalidation history. Entries are never rewritten on invalidation; an
/// entry is stale once any prefix covering its key was invalidated after the
/// entry's generation.
#[derive(Default)]
struct Invalidations {
    generation: u64,
    prefixes: HashMap<QueryKey, u64>,
}

impl Invalidations {
    fn bump(&mut self, prefix: &QueryKey) -> u64 {
        self.generation += 1;
        self.prefixes.insert(prefix.clone(), self.generation);
        self.generation
    }

    fn covers(&self, key: &QueryKey, since: u64) -> bool {
        self.prefixes
            .iter()
            .any(|(prefix, generation)| *generation > since && key.starts_with(prefix))
    }
}

/// Shared query cache.
///
/// Cheap to clone; clones share the cache, statuses and event channel.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<QueryClientInner>,
}

struct QueryClientInner {
    cache: Cache<QueryKey, CachedEntry>,
    statuses: Mutex<HashMap<QueryKey, QueryStatus>>,
    invalidations: Mutex<Invalidations>,
    events: broadcast::Sender<QueryEvent>,
    config: QueryConfig,
}

impl QueryClient {
    #[must_use]
    pub fn new(config: QueryConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.gc_time)
            .build();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(QueryClientInner {
                cache,
                statuses: Mutex::new(HashMap::new()),
                invalidations: Mutex::new(Invalidations::default()),
                events,
                config,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &QueryConfig {
        &self.inner.config
    }

    /// Return cached data for `key` if it is still fresh, otherwise run
    /// `fetcher` (retrying per the query config) and cache the result.
    ///
    /// A result whose key is invalidated while the fetcher runs is cached
    /// as already stale.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's last error once retries are exhausted.
    #[instrument(skip(self, fetcher), fields(key = %key))]
    pub async fn fetch<T, E, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: fmt::Display,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(data) = self.fresh::<T>(key).await {
            debug!("Cache hit");
            return Ok(data);
        }

        self.set_status(key, QueryStatus::Loading);

        let mut attempt = 0;
        loop {
            let generation = self.invalidations().generation;
            match fetcher().await {
                Ok(data) => {
                    self.store(key, data.clone(), generation).await;
                    self.set_status(key, QueryStatus::Success);
                    return Ok(data);
                }
                Err(e) if attempt < self.inner.config.retry => {
                    attempt += 1;
                    warn!(error = %e, attempt, "Query failed, retrying");
                    tokio::time::sleep(self.inner.config.retry_delay).await;
                }
                Err(e) => {
                    warn!(error = %e, "Query failed");
                    self.set_status(key, QueryStatus::Error(e.to_string()));
                    return Err(e);
                }
            }
        }
    }

    /// Cached data for `key`, fresh or not.
    pub async fn cached<T>(&self, key: &QueryKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entry = self.inner.cache.get(key).await?;
        entry.data.downcast_ref::<T>().cloned()
    }

    /// Store `data` under `key` and publish an update.
    pub async fn set_data<T>(&self, key: &QueryKey, data: T)
    where
        T: Send + Sync + 'static,
    {
        let generation = self.invalidations().generation;
        self.store(key, data, generation).await;
        self.set_status(key, QueryStatus::Success);
    }

    /// Whether the next [`fetch`](Self::fetch) of `key` will call its fetcher.
    pub async fn is_stale(&self, key: &QueryKey) -> bool {
        match self.inner.cache.get(key).await {
            Some(entry) => !self.is_current(key, &entry),
            None => true,
        }
    }

    /// Mark every entry whose key starts with `prefix` as stale and publish
    /// an [`QueryEvent::Invalidated`] event. Returns the number of entries
    /// marked.
    #[instrument(skip(self), fields(prefix = %prefix))]
    pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
        let generation = self.invalidations().bump(prefix);
        let count = self
            .inner
            .cache
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && entry.generation < generation)
            .count();

        debug!(count, generation, "Invalidated queries");
        self.publish(QueryEvent::Invalidated(prefix.clone()));
        count
    }

    /// Drop every cached entry and status.
    pub async fn clear(&self) {
        let root = QueryKey::new(Vec::<String>::new());
        {
            // The root covers every key, so older prefixes are redundant.
            let mut invalidations = self.invalidations();
            invalidations.prefixes.clear();
            invalidations.bump(&root);
        }
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
        self.statuses().clear();
        self.publish(QueryEvent::Invalidated(root));
    }

    /// Current status of `key`.
    #[must_use]
    pub fn status(&self, key: &QueryKey) -> QueryStatus {
        self.statuses().get(key).cloned().unwrap_or_default()
    }

    /// Receive cache events from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<QueryEvent> {
        self.inner.events.subscribe()
    }

    async fn fresh<T>(&self, key: &QueryKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entry = self.inner.cache.get(key).await?;
        if !self.is_current(key, &entry) {
            return None;
        }
        entry.data.downcast_ref::<T>().cloned()
    }

    fn is_current(&self, key: &QueryKey, entry: &CachedEntry) -> bool {
        entry.fetched_at.elapsed() < self.inner.config.stale_time
            && !self.invalidations().covers(key, entry.generation)
    }

    async fn store<T>(&self, key: &QueryKey, data: T, generation: u64)
    where
        T: Send + Sync + 'static,
    {
        let entry = CachedEntry {
            data: Arc::new(data),
            fetched_at: Instant::now(),
            generation,
        };
        self.inner.cache.insert(key.clone(), entry).await;
        self.publish(QueryEvent::Updated(key.clone()));
    }

    fn publish(&self, event: QueryEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    fn set_status(&self, key: &QueryKey, status: QueryStatus) {
        self.statuses().insert(key.clone(), status);
    }

    fn statuses(&self) -> std::sync::MutexGuard<'_, HashMap<QueryKey, QueryStatus>> {
        self.inner
            .statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn invalidations(&self) -> std::sync::MutexGuard<'_, Invalidations> {
        self.inner
            .invalidations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
