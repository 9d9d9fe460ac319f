//! The per-process data layer.
//!
//! `DataLayer` owns the one response cache, performance monitor and auditor
//! of the running application and hands out the fetchers that share them.
//! Build it once at startup and pass references to consumers.

use std::sync::Arc;

use tracing::debug;

use crate::api::Transport;
use crate::cache::{CachedFetcher, ResponseCache, SweeperHandle};
use crate::config::Config;
use crate::fetch::{BatchFetcher, ChannelBudget};
use crate::perf::{PerfStore, PerformanceAuditor, PerformanceMonitor};
use crate::probe::ConnectivityProber;

pub struct DataLayer {
    cache: Arc<ResponseCache>,
    monitor: Arc<PerformanceMonitor>,
    auditor: Arc<PerformanceAuditor>,
    batch: BatchFetcher,
    cached: CachedFetcher,
    slow_endpoint_ms: u64,
    _sweeper: SweeperHandle,
}

impl DataLayer {
    /// Wire up the shared services. Must be called inside a tokio runtime
    /// (the cache sweeper is spawned here).
    pub fn new(transport: Arc<dyn Transport>, config: &Config, store: Arc<dyn PerfStore>) -> Self {
        let cache = Arc::new(ResponseCache::with_default_ttl(config.default_ttl()));
        let monitor = Arc::new(PerformanceMonitor::new(store));
        let auditor = Arc::new(PerformanceAuditor::new());

        let batch = BatchFetcher::new(Arc::clone(&transport))
            .with_monitor(Arc::clone(&monitor))
            .with_auditor(Arc::clone(&auditor))
            .with_budget(ChannelBudget {
                primary: config.primary_timeout(),
                secondary: config.secondary_timeout(),
            });
        let cached = CachedFetcher::new(transport, Arc::clone(&cache))
            .with_monitor(Arc::clone(&monitor))
            .with_auditor(Arc::clone(&auditor));

        let sweeper = cache.spawn_sweeper(config.sweep_interval());
        debug!(
            default_ttl_secs = config.default_ttl_secs,
            sweep_interval_secs = config.sweep_interval_secs,
            "Data layer ready"
        );

        Self {
            cache,
            monitor,
            auditor,
            batch,
            cached,
            slow_endpoint_ms: config.slow_endpoint_ms,
            _sweeper: sweeper,
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn monitor(&self) -> &Arc<PerformanceMonitor> {
        &self.monitor
    }

    pub fn auditor(&self) -> &Arc<PerformanceAuditor> {
        &self.auditor
    }

    pub fn batch(&self) -> &BatchFetcher {
        &self.batch
    }

    pub fn cached(&self) -> &CachedFetcher {
        &self.cached
    }

    pub fn prober(&self) -> ConnectivityProber {
        ConnectivityProber::new(self.batch.clone()).with_slow_threshold(self.slow_endpoint_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, Resource};
    use crate::fetch::BatchRequest;
    use crate::perf::MemoryPerfStore;
    use crate::testing::MockTransport;
    use serde_json::json;

    #[tokio::test]
    async fn test_services_share_one_cache_and_monitor() {
        let transport = Arc::new(
            MockTransport::new()
                .ok("/api/stocks", json!([{"item": "rebar"}]))
                .ok("/api/projects", json!([])),
        );
        let layer = DataLayer::new(transport.clone(), &Config::default(), Arc::new(MemoryPerfStore::new()));

        layer
            .cached()
            .fetch_cached("/api/stocks", CacheKey::all(Resource::Stocks), None)
            .await
            .unwrap();
        assert!(layer.cache().contains(&CacheKey::all(Resource::Stocks)));

        layer.batch().fetch_all(&[BatchRequest::from("/api/projects")]).await;

        let summary = layer.monitor().get_summary();
        assert!(summary.contains_key("fetch:stocks"));
        assert!(summary.contains_key("batch_fetch"));
        assert_eq!(layer.auditor().report().observed, 2);
    }

    #[tokio::test]
    async fn test_budget_comes_from_config() {
        let config = Config {
            primary_timeout_secs: 20,
            secondary_timeout_secs: 5,
            ..Config::default()
        };
        let layer = DataLayer::new(Arc::new(MockTransport::new()), &config, Arc::new(MemoryPerfStore::new()));
        let budget = layer.batch().budget();
        assert_eq!(budget.primary.as_secs(), 20);
        assert_eq!(budget.secondary.as_secs(), 5);
    }
}
