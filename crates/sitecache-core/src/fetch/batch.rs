use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::api::Transport;
use crate::error::{FetchError, TIMEOUT_ERROR};
use crate::perf::{PerformanceAuditor, PerformanceMonitor};

use super::{read, ChannelBudget};

/// Operation id under which whole batches are timed.
pub const BATCH_OPERATION: &str = "batch_fetch";

/// A single read in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BatchRequest {
    pub url: String,
}

impl BatchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl From<&str> for BatchRequest {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

/// Outcome of one request. `data` is set only on success, `error` only on
/// failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub url: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts", ts(type = "unknown"))]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Time for this request to settle.
    #[serde(default)]
    pub duration_ms: u64,
}

impl BatchResult {
    pub fn from_outcome(url: &str, outcome: Result<Value, FetchError>, elapsed: Duration) -> Self {
        let duration_ms = elapsed.as_millis() as u64;
        match outcome {
            Ok(data) => Self {
                url: url.to_string(),
                success: true,
                data: Some(data),
                error: None,
                duration_ms,
            },
            Err(e) => Self {
                url: url.to_string(),
                success: false,
                data: None,
                error: Some(e.to_string()),
                duration_ms,
            },
        }
    }

    pub fn timed_out(&self) -> bool {
        self.error.as_deref() == Some(TIMEOUT_ERROR)
    }

    /// Serialized size of the payload in bytes (0 when absent).
    pub fn payload_size(&self) -> usize {
        self.data
            .as_ref()
            .and_then(|data| serde_json::to_vec(data).ok())
            .map(|bytes| bytes.len())
            .unwrap_or(0)
    }

    /// Operator-facing message for a failed result. Timeouts get a distinct
    /// "try again" message; `None` on success.
    pub fn failure_message(&self) -> Option<String> {
        if self.success {
            return None;
        }
        if self.timed_out() {
            return Some(format!(
                "{} is taking longer than usual to respond. Please try again.",
                self.url
            ));
        }
        Some(format!(
            "Failed to load {}: {}",
            self.url,
            self.error.as_deref().unwrap_or("unknown error")
        ))
    }
}

/// Issues groups of reads concurrently and reports every outcome.
#[derive(Clone)]
pub struct BatchFetcher {
    transport: Arc<dyn Transport>,
    monitor: Option<Arc<PerformanceMonitor>>,
    auditor: Option<Arc<PerformanceAuditor>>,
    pub(super) budget: ChannelBudget,
}

impl BatchFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            monitor: None,
            auditor: None,
            budget: ChannelBudget::default(),
        }
    }

    /// Time whole batches in the rolling monitor
    pub fn with_monitor(mut self, monitor: Arc<PerformanceMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Report each request's duration to the auditor
    pub fn with_auditor(mut self, auditor: Arc<PerformanceAuditor>) -> Self {
        self.auditor = Some(auditor);
        self
    }

    pub fn with_budget(mut self, budget: ChannelBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn budget(&self) -> ChannelBudget {
        self.budget
    }

    /// Fetch every request concurrently with no per-request time limit.
    pub async fn fetch_all(&self, requests: &[BatchRequest]) -> Vec<BatchResult> {
        self.fetch_all_within(requests, None).await
    }

    /// Fetch every request concurrently, each capped at `limit` if given.
    ///
    /// Always resolves to exactly `requests.len()` results in input order.
    pub async fn fetch_all_within(
        &self,
        requests: &[BatchRequest],
        limit: Option<Duration>,
    ) -> Vec<BatchResult> {
        if requests.is_empty() {
            debug!("Empty batch, nothing to fetch");
            return Vec::new();
        }

        let started = Instant::now();
        let futures: Vec<_> = requests
            .iter()
            .map(|request| self.fetch_one(request, limit))
            .collect();
        let results = futures::future::join_all(futures).await;
        let elapsed = started.elapsed();

        let succeeded = results.iter().filter(|r| r.success).count();
        info!(
            total = results.len(),
            succeeded,
            failed = results.len() - succeeded,
            elapsed_ms = elapsed.as_millis() as u64,
            "Batch fetch complete"
        );
        if let Some(ref monitor) = self.monitor {
            monitor.record(BATCH_OPERATION, elapsed);
        }

        results
    }

    /// Fetch a single request into a result; never fails.
    pub(super) async fn fetch_one(&self, request: &BatchRequest, limit: Option<Duration>) -> BatchResult {
        let started = Instant::now();
        let outcome = read(self.transport.as_ref(), &request.url, limit).await;
        let elapsed = started.elapsed();

        if let Err(ref e) = outcome {
            debug!(url = %request.url, error = %e, "Request failed");
        }
        if let Some(ref auditor) = self.auditor {
            auditor.record(&request.url, elapsed);
        }

        BatchResult::from_outcome(&request.url, outcome, elapsed)
    }
}
