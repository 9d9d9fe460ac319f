//! Backend connectivity checks.
//!
//! `ConnectivityProber` drives the batch fetcher over fixed catalogs of
//! read-only routes (one per role) to produce a health/latency summary, and
//! runs small per-feature checks for the diagnostics screen.

pub mod catalog;
pub mod prober;

pub use catalog::{admin_catalog, known_features, site_manager_catalog, Endpoint, EndpointRole};
pub use prober::{
    ConnectivityProber, ConnectivitySummary, EndpointProbeResult, FeatureCheck,
    SLOW_ENDPOINT_MS,
};
