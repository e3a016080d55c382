//! Contracts of the asynchronous cache layer, plus an in-memory implementation.
//!
//! The hooks hand the cache a key and a fetch function (reads) or a mutation
//! function (writes); de-duplication, staleness, retries and invalidation are
//! the cache's business. [`MemoryCache`] is a small in-process implementation
//! of both contracts.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::key::CacheKey;

/// Options forwarded verbatim to the cache layer by a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// When false the read does not fetch; cached data is still returned.
    pub enabled: bool,
    /// How long a successful result is served before refetching. `None` keeps it until invalidated.
    pub stale_time: Option<Duration>,
    /// Extra attempts after a failed fetch.
    pub retry: u32,
    /// Ignore any cached result and fetch again.
    pub refetch: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_time: None,
            retry: 0,
            refetch: false,
        }
    }
}

/// Options forwarded verbatim to the cache layer by a write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOptions {
    /// Extra attempts after a failed mutation.
    pub retry: u32,
    /// Read keys to invalidate once the mutation succeeds.
    pub invalidates: Vec<CacheKey>,
}

/// Lifecycle of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Not started.
    Idle,
    /// In flight.
    Pending,
    /// Settled with data.
    Success,
    /// Settled with an error.
    Error,
}

/// Status, data and error of an operation as exposed to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T, E> {
    /// Where the operation is in its lifecycle.
    pub status: Status,
    /// Success value.
    pub data: Option<T>,
    /// Failure value.
    pub error: Option<E>,
}

impl<T, E> QueryResult<T, E> {
    /// Nothing has run yet.
    pub fn idle() -> Self {
        Self {
            status: Status::Idle,
            data: None,
            error: None,
        }
    }

    /// An operation is in flight.
    pub fn pending() -> Self {
        Self {
            status: Status::Pending,
            data: None,
            error: None,
        }
    }

    /// A settled operation.
    pub fn from_result(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self {
                status: Status::Success,
                data: Some(data),
                error: None,
            },
            Err(error) => Self {
                status: Status::Error,
                data: None,
                error: Some(error),
            },
        }
    }

    /// Settled with data.
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Settled with an error.
    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }

    /// The settled outcome, or `None` while idle or pending.
    pub fn into_result(self) -> Option<Result<T, E>> {
        match (self.data, self.error) {
            (Some(data), _) => Some(Ok(data)),
            (None, Some(error)) => Some(Err(error)),
            (None, None) => None,
        }
    }
}

/// State of a write operation.
pub type MutationState<T, E> = QueryResult<T, E>;

/// Read side of the cache layer.
pub trait QueryCache: Send + Sync {
    /// Resolve the read identified by `key`, calling `fetch` when the cache
    /// decides a network round-trip is needed.
    fn query<T, E, F, Fut>(
        &self,
        key: CacheKey,
        options: &QueryOptions,
        fetch: F,
    ) -> impl Future<Output = QueryResult<T, E>> + Send
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, E>> + Send;

    /// Drop the entry for `key`. Returns whether one existed.
    fn invalidate(&self, key: &CacheKey) -> bool;
}

/// Write side of the cache layer.
pub trait MutationCache: Send + Sync {
    /// Run a one-shot mutation. Nothing is stored under a key.
    fn mutate<T, E, F, Fut>(
        &self,
        options: &MutationOptions,
        mutation: F,
    ) -> impl Future<Output = Result<T, E>> + Send
    where
        T: Send,
        E: Send,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, E>> + Send;
}

type Stored = Arc<dyn Any + Send + Sync>;

struct Fetched {
    at: Instant,
    value: Stored,
}

#[derive(Default)]
struct Entry {
    cell: Arc<OnceCell<Fetched>>,
}

/// In-process cache keyed by [`CacheKey`].
///
/// Concurrent reads of one key share a single fetch. Failed results are not
/// reused: the next read of that key fetches again.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

impl MemoryCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held, in flight or settled.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no key is held.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether `key` is held, in flight or settled.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().contains_key(key)
    }

    /// Drop every entry whose key belongs to `endpoint`. Returns how many were removed.
    pub fn invalidate_endpoint(&self, endpoint: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| key.endpoint() != endpoint);
        let removed = before - entries.len();
        debug!(endpoint, removed, "Invalidated cache entries for endpoint.");
        removed
    }

    /// Settled successful value for `key`, if one of type `Result<T, E>` is held.
    fn peek<T, E>(&self, key: &CacheKey) -> Option<Result<T, E>>
    where
        T: Clone + 'static,
        E: Clone + 'static,
    {
        let entries = self.lock();
        let fetched = entries.get(key)?.cell.get()?;
        fetched.value.downcast_ref::<Result<T, E>>().cloned()
    }

    /// The cell to resolve `key` through: the current one while it is in
    /// flight or holds a fresh success, otherwise a new empty one.
    fn slot<T, E>(&self, key: &CacheKey, options: &QueryOptions) -> Arc<OnceCell<Fetched>>
    where
        T: 'static,
        E: 'static,
    {
        let mut entries = self.lock();
        if let Some(entry) = entries.get(key)
            && !options.refetch
        {
            let reusable = match entry.cell.get() {
                None => true,
                Some(fetched) => {
                    let fresh = options
                        .stale_time
                        .is_none_or(|stale_time| fetched.at.elapsed() < stale_time);
                    let succeeded = fetched
                        .value
                        .downcast_ref::<Result<T, E>>()
                        .is_some_and(Result::is_ok);
                    fresh && succeeded
                }
            };
            if reusable {
                return Arc::clone(&entry.cell);
            }
        }

        let entry = Entry::default();
        let cell = Arc::clone(&entry.cell);
        entries.insert(key.clone(), entry);
        cell
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run `op`, retrying up to `retry` extra times on failure.
async fn with_retry<T, E, F, Fut>(op: &F, retry: u32) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(_) if attempt < retry => {
                attempt += 1;
                debug!(attempt, retry, "Operation failed, retrying.");
            }
            Err(err) => return Err(err),
        }
    }
}

impl QueryCache for MemoryCache {
    async fn query<T, E, F, Fut>(
        &self,
        key: CacheKey,
        options: &QueryOptions,
        fetch: F,
    ) -> QueryResult<T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        if !options.enabled {
            return self
                .peek::<T, E>(&key)
                .map_or_else(QueryResult::idle, QueryResult::from_result);
        }

        let cell = self.slot::<T, E>(&key, options);
        let fetched = cell
            .get_or_init(|| async {
                debug!(%key, "Cache miss, fetching.");
                let result = with_retry(&fetch, options.retry).await;
                Fetched {
                    at: Instant::now(),
                    value: Arc::new(result),
                }
            })
            .await;

        if let Some(result) = fetched.value.downcast_ref::<Result<T, E>>() {
            return QueryResult::from_result(result.clone());
        }

        // Another reader stored a different type under the same key.
        warn!(%key, "Cached value has an unexpected type, fetching uncached.");
        QueryResult::from_result(with_retry(&fetch, options.retry).await)
    }

    fn invalidate(&self, key: &CacheKey) -> bool {
        let removed = self.lock().remove(key).is_some();
        debug!(%key, removed, "Invalidated cache entry.");
        removed
    }
}

impl MutationCache for MemoryCache {
    async fn mutate<T, E, F, Fut>(&self, options: &MutationOptions, mutation: F) -> Result<T, E>
    where
        T: Send,
        E: Send,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        let result = with_retry(&mutation, options.retry).await;
        if result.is_ok() {
            for key in &options.invalidates {
                self.invalidate(key);
            }
        }
        result
    }
}
