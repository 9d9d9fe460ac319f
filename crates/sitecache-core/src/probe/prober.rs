use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::error::ProbeError;
use crate::fetch::{BatchFetcher, BatchRequest, BatchResult};

use super::catalog::{self, Endpoint, EndpointRole};

/// Endpoints slower than this are listed as slow in the summary.
pub const SLOW_ENDPOINT_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct EndpointProbeResult {
    pub path: String,
    pub description: String,
    #[serde(rename = "type")]
    pub role: EndpointRole,
    pub success: bool,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub payload_size: usize,
}

impl EndpointProbeResult {
    fn from_batch(result: BatchResult, description: String, role: EndpointRole) -> Self {
        Self {
            payload_size: result.payload_size(),
            path: result.url,
            description,
            role,
            success: result.success,
            duration_ms: result.duration_ms,
            error: result.error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ConnectivitySummary {
    pub total_admin: usize,
    pub total_site_manager: usize,
    pub admin_success: usize,
    pub admin_failed: usize,
    pub site_manager_success: usize,
    pub site_manager_failed: usize,
    /// Every probe, admin group first.
    pub results: Vec<EndpointProbeResult>,
    pub failed: Vec<EndpointProbeResult>,
    /// Probes that took longer than the slow threshold, successful or not.
    pub slow: Vec<EndpointProbeResult>,
    pub elapsed_ms: u64,
}

impl ConnectivitySummary {
    pub fn total(&self) -> usize {
        self.total_admin + self.total_site_manager
    }

    pub fn succeeded(&self) -> usize {
        self.admin_success + self.site_manager_success
    }

    /// Nothing answered: treat the backend as unreachable.
    pub fn is_down(&self) -> bool {
        self.total() > 0 && self.succeeded() == 0
    }

    pub fn is_healthy(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct FeatureCheck {
    pub feature: String,
    /// True only if every endpoint of the feature answered.
    pub success: bool,
    /// Sum of the individual endpoint durations.
    pub total_duration_ms: u64,
    pub results: Vec<EndpointProbeResult>,
}

/// Health and latency checks over the backend route catalogs.
#[derive(Clone)]
pub struct ConnectivityProber {
    fetcher: BatchFetcher,
    admin: Vec<Endpoint>,
    site_manager: Vec<Endpoint>,
    slow_threshold_ms: u64,
}

impl ConnectivityProber {
    /// Prober over the built-in route catalogs
    pub fn new(fetcher: BatchFetcher) -> Self {
        Self::with_catalog(fetcher, catalog::admin_catalog(), catalog::site_manager_catalog())
    }

    pub fn with_catalog(fetcher: BatchFetcher, admin: Vec<Endpoint>, site_manager: Vec<Endpoint>) -> Self {
        Self {
            fetcher,
            admin,
            site_manager,
            slow_threshold_ms: SLOW_ENDPOINT_MS,
        }
    }

    pub fn with_slow_threshold(mut self, threshold_ms: u64) -> Self {
        self.slow_threshold_ms = threshold_ms;
        self
    }

    pub fn admin_endpoints(&self) -> &[Endpoint] {
        &self.admin
    }

    pub fn site_manager_endpoints(&self) -> &[Endpoint] {
        &self.site_manager
    }

    async fn probe_group(&self, endpoints: &[Endpoint], role: EndpointRole) -> Vec<EndpointProbeResult> {
        let requests: Vec<BatchRequest> = endpoints
            .iter()
            .map(|e| BatchRequest::new(e.path.clone()))
            .collect();

        self.fetcher
            .fetch_all(&requests)
            .await
            .into_iter()
            .zip(endpoints)
            .map(|(result, endpoint)| {
                EndpointProbeResult::from_batch(result, endpoint.description.clone(), role)
            })
            .collect()
    }

    /// Probe every catalogued route, one batch per role group.
    pub async fn probe_all(&self) -> ConnectivitySummary {
        let started = Instant::now();
        let (admin, site_manager) = tokio::join!(
            self.probe_group(&self.admin, EndpointRole::Admin),
            self.probe_group(&self.site_manager, EndpointRole::SiteManager),
        );

        let admin_success = admin.iter().filter(|r| r.success).count();
        let site_manager_success = site_manager.iter().filter(|r| r.success).count();

        let results: Vec<EndpointProbeResult> = admin.into_iter().chain(site_manager).collect();
        let failed: Vec<_> = results.iter().filter(|r| !r.success).cloned().collect();
        let slow: Vec<_> = results
            .iter()
            .filter(|r| r.duration_ms > self.slow_threshold_ms)
            .cloned()
            .collect();

        let summary = ConnectivitySummary {
            total_admin: self.admin.len(),
            total_site_manager: self.site_manager.len(),
            admin_success,
            admin_failed: self.admin.len() - admin_success,
            site_manager_success,
            site_manager_failed: self.site_manager.len() - site_manager_success,
            results,
            failed,
            slow,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        if summary.is_down() {
            warn!(total = summary.total(), "No endpoint answered, backend unreachable");
        }
        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed.len(),
            slow = summary.slow.len(),
            elapsed_ms = summary.elapsed_ms,
            "Connectivity probe complete"
        );
        summary
    }

    /// Check the routes behind one dashboard feature.
    pub async fn probe_one(&self, feature: &str) -> Result<FeatureCheck, ProbeError> {
        let (name, routes) = catalog::feature_routes(feature)
            .ok_or_else(|| ProbeError::UnknownFeature(feature.to_string()))?;

        let requests: Vec<BatchRequest> = routes.iter().map(|path| BatchRequest::from(*path)).collect();
        let results: Vec<EndpointProbeResult> = self
            .fetcher
            .fetch_all(&requests)
            .await
            .into_iter()
            .map(|result| {
                let description = catalog::describe(&result.url);
                EndpointProbeResult::from_batch(result, description, EndpointRole::Admin)
            })
            .collect();

        let check = FeatureCheck {
            feature: name.to_string(),
            success: results.iter().all(|r| r.success),
            total_duration_ms: results.iter().map(|r| r.duration_ms).sum(),
            results,
        };
        info!(
            feature = %check.feature,
            success = check.success,
            total_duration_ms = check.total_duration_ms,
            "Feature check complete"
        );
        Ok(check)
    }
}
