//! Cache-first reads with request coalescing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::api::Transport;
use crate::error::FetchError;
use crate::fetch::read;
use crate::perf::{PerformanceAuditor, PerformanceMonitor};

use super::{CacheKey, Resource, ResponseCache};

type SharedFetch = Shared<BoxFuture<'static, Result<Value, FetchError>>>;
type PendingMap = Arc<Mutex<HashMap<CacheKey, SharedFetch>>>;

/// Reads through the shared response cache.
///
/// A hit returns immediately. On a miss the backend is read once per key
/// even if several callers ask at the same time: later callers await the
/// fetch already in flight. Only successful reads are cached, so a failure
/// is retried by the next call.
#[derive(Clone)]
pub struct CachedFetcher {
    transport: Arc<dyn Transport>,
    cache: Arc<ResponseCache>,
    pending: PendingMap,
    monitor: Option<Arc<PerformanceMonitor>>,
    auditor: Option<Arc<PerformanceAuditor>>,
}

impl CachedFetcher {
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<ResponseCache>) -> Self {
        Self {
            transport,
            cache,
            pending: Arc::new(Mutex::new(HashMap::new())),
            monitor: None,
            auditor: None,
        }
    }

    pub fn with_monitor(mut self, monitor: Arc<PerformanceMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn with_auditor(mut self, auditor: Arc<PerformanceAuditor>) -> Self {
        self.auditor = Some(auditor);
        self
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Return the cached value for `key`, or read `path` and cache it for
    /// `ttl` (the cache default when `None`).
    ///
    /// A caller that joins a fetch already in flight gets that fetch's
    /// result, and its own `ttl` is ignored: the caller that started the
    /// fetch decides how long the value is cached.
    pub async fn fetch_cached(
        &self,
        path: &str,
        key: CacheKey,
        ttl: Option<Duration>,
    ) -> Result<Value, FetchError> {
        if let Some(value) = self.cache.get(&key) {
            debug!(key = %key, "Cache hit");
            return Ok(value);
        }

        let fetch = {
            let mut pending = self.pending.lock();
            match pending.get(&key) {
                Some(in_flight) => {
                    debug!(key = %key, "Joining in-flight fetch");
                    in_flight.clone()
                }
                None => {
                    debug!(key = %key, path, "Cache miss, fetching");
                    let fetch = self.load(path.to_string(), key.clone(), ttl).boxed().shared();
                    pending.insert(key, fetch.clone());
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Number of keys with a fetch currently in flight.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Drop the cached value for `key` so the next read goes to the backend.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.cache.remove(key)
    }

    /// Drop every cached value of a resource family. Returns how many went.
    pub fn invalidate_resource(&self, resource: Resource) -> usize {
        let removed = self.cache.remove_where(|key| key.resource == resource);
        debug!(resource = %resource, removed, "Invalidated cached resource");
        removed
    }

    fn load(
        &self,
        path: String,
        key: CacheKey,
        ttl: Option<Duration>,
    ) -> impl std::future::Future<Output = Result<Value, FetchError>> + Send + 'static {
        let transport = Arc::clone(&self.transport);
        let cache = Arc::clone(&self.cache);
        let pending = Arc::clone(&self.pending);
        let monitor = self.monitor.clone();
        let auditor = self.auditor.clone();

        async move {
            let started = Instant::now();
            let outcome = read(transport.as_ref(), &path, None).await;
            let elapsed = started.elapsed();

            let operation = format!("fetch:{}", key);
            if let Some(monitor) = monitor {
                monitor.record(&operation, elapsed);
            }
            if let Some(auditor) = auditor {
                auditor.record(&operation, elapsed);
            }

            match outcome {
                Ok(ref value) => {
                    let ttl = ttl.unwrap_or_else(|| cache.default_ttl());
                    cache.set_with_ttl(key.clone(), value.clone(), ttl);
                    debug!(key = %key, ttl_secs = ttl.as_secs(), "Cached fetch result");
                }
                Err(ref e) => debug!(key = %key, error = %e, "Fetch failed, not caching"),
            }

            // After the cache write, so late callers find the value there.
            pending.lock().remove(&key);
            outcome
        }
    }
}
