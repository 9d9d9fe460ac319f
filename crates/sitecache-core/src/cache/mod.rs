//! In-memory caching of backend reads.
//!
//! - `TtlCache`: key/value store with per-entry expiry and a background sweeper
//! - `CacheKey`/`Resource`: structured keys for dashboard data
//! - `CachedFetcher`: cache-first reads with request coalescing
//!
//! Nothing here persists; a fresh process starts cold.

pub mod fetch;
pub mod key;
pub mod ttl;

pub use fetch::CachedFetcher;
pub use key::{CacheKey, Resource};
pub use ttl::{CacheStats, SweeperHandle, TtlCache, DEFAULT_TTL, SWEEP_INTERVAL};

/// The cache shape used for backend payloads.
pub type ResponseCache = TtlCache<CacheKey, serde_json::Value>;
