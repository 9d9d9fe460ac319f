//! Dual-channel fetch for one known-slow endpoint.
//!
//! The stock listing takes far longer than every other dashboard route. It
//! runs on its own channel with a longer budget while the remaining routes
//! go through an ordinary batch with a shorter per-request budget. Neither
//! channel can cancel or delay the other's results.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use super::{BatchFetcher, BatchRequest, BatchResult};

/// Time budget for the slow primary endpoint.
pub const PRIMARY_TIMEOUT: Duration = Duration::from_secs(15);

/// Time budget for each secondary endpoint.
pub const SECONDARY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelBudget {
    pub primary: Duration,
    pub secondary: Duration,
}

impl Default for ChannelBudget {
    fn default() -> Self {
        Self {
            primary: PRIMARY_TIMEOUT,
            secondary: SECONDARY_TIMEOUT,
        }
    }
}

impl BatchFetcher {
    /// Fetch `primary` on its own budget and `secondary` as one batch.
    ///
    /// The result list is always `[primary, secondary...]` in submission
    /// order, regardless of which channel settles first. A primary timeout
    /// is reported as `error: "timeout"`.
    pub async fn fetch_primary_and_secondary(
        &self,
        primary: &BatchRequest,
        secondary: &[BatchRequest],
    ) -> Vec<BatchResult> {
        let started = Instant::now();

        let (primary_result, secondary_results) = tokio::join!(
            self.fetch_one(primary, Some(self.budget.primary)),
            self.fetch_all_within(secondary, Some(self.budget.secondary)),
        );

        if primary_result.timed_out() {
            warn!(
                url = %primary.url,
                budget_ms = self.budget.primary.as_millis() as u64,
                "Primary channel timed out"
            );
        }
        info!(
            primary_ok = primary_result.success,
            secondary_ok = secondary_results.iter().filter(|r| r.success).count(),
            secondary_total = secondary_results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dual-channel fetch complete"
        );

        let mut results = Vec::with_capacity(1 + secondary_results.len());
        results.push(primary_result);
        results.extend(secondary_results);
        results
    }
}
