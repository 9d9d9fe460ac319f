//! Core library for sitecache.
//!
//! Client-side data layer for the site management dashboard: a TTL cache
//! with request coalescing, a batch fetcher that tolerates partial failure,
//! a dual-channel fetcher for the slow stock endpoint, rolling performance
//! tracking, a slow-operation auditor, and a connectivity prober.
//!
//! Everything hangs off a single [`DataLayer`] built once per process.

pub mod api;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod models;
pub mod perf;
pub mod probe;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError, Transport};
pub use cache::{CacheKey, CachedFetcher, Resource, ResponseCache, TtlCache};
pub use config::Config;
pub use context::DataLayer;
pub use error::{FetchError, ProbeError};
pub use fetch::{BatchFetcher, BatchRequest, BatchResult, ChannelBudget};
pub use models::Envelope;
pub use perf::{
    FilePerfStore, MemoryPerfStore, PerfStore, PerformanceAuditor, PerformanceMonitor,
};
pub use probe::{ConnectivityProber, ConnectivitySummary, EndpointProbeResult, FeatureCheck};
