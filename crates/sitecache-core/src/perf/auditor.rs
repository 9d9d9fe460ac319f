use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::warn;

/// Remote operations above this many milliseconds are slow.
pub const SLOW_THRESHOLD_MS: u64 = 2000;

/// Remote operations above this many milliseconds are very slow.
pub const VERY_SLOW_THRESHOLD_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Slow,
    VerySlow,
}

impl Severity {
    /// `None` when the duration is within budget.
    pub fn from_millis(ms: u64) -> Option<Self> {
        if ms > VERY_SLOW_THRESHOLD_MS {
            Some(Severity::VerySlow)
        } else if ms > SLOW_THRESHOLD_MS {
            Some(Severity::Slow)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Slow => "slow",
            Severity::VerySlow => "very slow",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub operation: String,
    pub duration_ms: u64,
    pub severity: Severity,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    /// Every operation seen by the auditor, offending or not.
    pub observed: u64,
    pub slow_count: usize,
    pub very_slow_count: usize,
    /// Offending operations, slowest first.
    pub entries: Vec<AuditEntry>,
}

impl AuditReport {
    pub fn slowest(&self) -> Option<&AuditEntry> {
        self.entries.first()
    }

    pub fn is_clean(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cumulative record of remote operations that blew the latency budget.
///
/// Unlike the rolling monitor, nothing is ever evicted until `clear`.
#[derive(Default)]
pub struct PerformanceAuditor {
    entries: Mutex<Vec<AuditEntry>>,
    observed: AtomicU64,
}

impl PerformanceAuditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one operation. Returns the severity if it was logged.
    pub fn record(&self, operation: &str, duration: Duration) -> Option<Severity> {
        self.observed.fetch_add(1, Ordering::Relaxed);

        let duration_ms = duration.as_millis() as u64;
        let severity = Severity::from_millis(duration_ms)?;
        warn!(
            operation,
            duration_ms,
            severity = severity.label(),
            "Slow remote operation"
        );

        self.entries.lock().push(AuditEntry {
            operation: operation.to_string(),
            duration_ms,
            severity,
            timestamp: Utc::now(),
        });
        Some(severity)
    }

    /// Time `fut` and record it as `operation`.
    pub async fn time<F: Future>(&self, operation: &str, fut: F) -> F::Output {
        let started = Instant::now();
        let output = fut.await;
        self.record(operation, started.elapsed());
        output
    }

    /// Offending operations in the order they were recorded.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    pub fn report(&self) -> AuditReport {
        let mut entries = self.entries();
        entries.sort_by(|a, b| b.duration_ms.cmp(&a.duration_ms));

        let very_slow_count = entries
            .iter()
            .filter(|e| e.severity == Severity::VerySlow)
            .count();

        AuditReport {
            observed: self.observed.load(Ordering::Relaxed),
            slow_count: entries.len() - very_slow_count,
            very_slow_count,
            entries,
        }
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
        self.observed.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(Severity::from_millis(2000), None);
        assert_eq!(Severity::from_millis(2001), Some(Severity::Slow));
        assert_eq!(Severity::from_millis(5000), Some(Severity::Slow));
        assert_eq!(Severity::from_millis(5001), Some(Severity::VerySlow));
    }

    #[test]
    fn test_only_offenders_are_kept_and_never_windowed() {
        let auditor = PerformanceAuditor::new();
        assert_eq!(auditor.record("/api/projects", Duration::from_millis(300)), None);
        for _ in 0..25 {
            auditor.record("/api/stocks", Duration::from_millis(2500));
        }
        auditor.record("/api/reports", Duration::from_millis(8000));

        let report = auditor.report();
        assert_eq!(report.observed, 27);
        assert_eq!(report.entries.len(), 26);
        assert_eq!(report.slow_count, 25);
        assert_eq!(report.very_slow_count, 1);
        assert_eq!(report.slowest().unwrap().operation, "/api/reports");
    }

    #[test]
    fn test_clear_resets_report() {
        let auditor = PerformanceAuditor::new();
        auditor.record("x", Duration::from_secs(3));
        auditor.clear();

        let report = auditor.report();
        assert!(report.is_clean());
        assert_eq!(report.observed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_records_elapsed() {
        let auditor = PerformanceAuditor::new();
        auditor
            .time("machines", tokio::time::sleep(Duration::from_millis(5500)))
            .await;

        let entries = auditor.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, Severity::VerySlow);
    }
}
