use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::store::{perf_key, PerfStore, PERF_KEY_PREFIX};

/// Operations under this many milliseconds are fast.
pub const FAST_THRESHOLD_MS: u64 = 500;

/// Operations under this many milliseconds (and not fast) are medium.
pub const MEDIUM_THRESHOLD_MS: u64 = 1500;

/// Samples retained per operation; older ones are dropped first.
pub const ROLLING_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Fast,
    Medium,
    Slow,
}

impl Classification {
    pub fn from_millis(ms: u64) -> Self {
        if ms < FAST_THRESHOLD_MS {
            Classification::Fast
        } else if ms < MEDIUM_THRESHOLD_MS {
            Classification::Medium
        } else {
            Classification::Slow
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Fast => "fast",
            Classification::Medium => "medium",
            Classification::Slow => "slow",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRecord {
    pub operation: String,
    pub duration_ms: u64,
    pub classification: Classification,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct OperationSummary {
    pub avg_duration_ms: f64,
    pub total_records: usize,
    pub fast_count: usize,
    pub medium_count: usize,
    pub slow_count: usize,
}

impl OperationSummary {
    fn from_records(records: &[PerformanceRecord]) -> Self {
        let count = |class: Classification| {
            records.iter().filter(|r| r.classification == class).count()
        };
        let total: u64 = records.iter().map(|r| r.duration_ms).sum();
        let avg_duration_ms = if records.is_empty() {
            0.0
        } else {
            total as f64 / records.len() as f64
        };

        Self {
            avg_duration_ms,
            total_records: records.len(),
            fast_count: count(Classification::Fast),
            medium_count: count(Classification::Medium),
            slow_count: count(Classification::Slow),
        }
    }
}

/// Rolling per-operation timing log.
///
/// `start`/`end` pairs are keyed by operation id; a second `start` for the
/// same id replaces the first. Completed samples go to the store, capped at
/// [`ROLLING_WINDOW`] per operation.
pub struct PerformanceMonitor {
    store: Arc<dyn PerfStore>,
    in_flight: Mutex<HashMap<String, Instant>>,
    // Serializes load-modify-save of a rolling log.
    write_lock: Mutex<()>,
}

impl PerformanceMonitor {
    pub fn new(store: Arc<dyn PerfStore>) -> Self {
        Self {
            store,
            in_flight: Mutex::new(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    pub fn start(&self, operation: &str) {
        self.in_flight.lock().insert(operation.to_string(), Instant::now());
    }

    /// Finish a timed operation. Returns `None` if `start` was never called.
    pub fn end(&self, operation: &str) -> Option<PerformanceRecord> {
        let started = self.in_flight.lock().remove(operation)?;
        Some(self.record(operation, started.elapsed()))
    }

    /// Time `fut` as `operation`.
    pub async fn measure<F: Future>(&self, operation: &str, fut: F) -> F::Output {
        self.start(operation);
        let output = fut.await;
        self.end(operation);
        output
    }

    /// Append an externally measured sample to the operation's rolling log.
    pub fn record(&self, operation: &str, duration: Duration) -> PerformanceRecord {
        let duration_ms = duration.as_millis() as u64;
        let record = PerformanceRecord {
            operation: operation.to_string(),
            duration_ms,
            classification: Classification::from_millis(duration_ms),
            timestamp: Utc::now(),
        };
        debug!(
            operation,
            duration_ms,
            classification = record.classification.label(),
            "Operation timed"
        );

        let key = perf_key(operation);
        let _guard = self.write_lock.lock();
        let mut log = self.load_log(&key);
        log.push(record.clone());
        if log.len() > ROLLING_WINDOW {
            let excess = log.len() - ROLLING_WINDOW;
            log.drain(..excess);
        }
        if let Err(e) = self.store.save(&key, &log) {
            warn!(operation, error = %e, "Failed to persist performance log");
        }

        record
    }

    /// Stored samples for one operation, oldest first.
    pub fn history(&self, operation: &str) -> Vec<PerformanceRecord> {
        self.load_log(&perf_key(operation))
    }

    /// Aggregate every persisted rolling log.
    pub fn get_summary(&self) -> BTreeMap<String, OperationSummary> {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to list performance logs");
                return BTreeMap::new();
            }
        };

        keys.iter()
            .filter_map(|key| {
                let operation = key.strip_prefix(PERF_KEY_PREFIX)?;
                let log = self.load_log(key);
                if log.is_empty() {
                    return None;
                }
                Some((operation.to_string(), OperationSummary::from_records(&log)))
            })
            .collect()
    }

    /// Wipe every persisted log and forget in-flight timers.
    pub fn clear(&self) {
        self.in_flight.lock().clear();

        let _guard = self.write_lock.lock();
        match self.store.keys() {
            Ok(keys) => {
                for key in keys {
                    if let Err(e) = self.store.remove(&key) {
                        warn!(key = %key, error = %e, "Failed to remove performance log");
                    }
                }
            }
            Err(e) => warn!(error = %e, "Failed to list performance logs"),
        }
    }

    /// Operations currently between `start` and `end`.
    pub fn in_flight(&self) -> Vec<String> {
        let mut ops: Vec<String> = self.in_flight.lock().keys().cloned().collect();
        ops.sort();
        ops
    }

    /// Load a log, treating unreadable storage as empty
    fn load_log(&self, key: &str) -> Vec<PerformanceRecord> {
        match self.store.load(key) {
            Ok(Some(log)) => log,
            Ok(None) => Vec::new(),
            Err(e) => {
                debug!(key = %key, error = %e, "Failed to load performance log");
                Vec::new()
            }
        }
    }
}
