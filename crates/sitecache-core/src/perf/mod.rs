//! Timing of backend operations.
//!
//! Two independent consumers of the same timing data:
//!
//! - `PerformanceMonitor`: rolling window of the last 10 samples per
//!   operation, persisted through a `PerfStore`, summarized for live badges.
//! - `PerformanceAuditor`: cumulative, in-memory list of slow (>2s) and very
//!   slow (>5s) operations for the operator audit report.
//!
//! They keep different thresholds and retention on purpose and are not
//! merged.

pub mod auditor;
pub mod monitor;
pub mod store;

pub use auditor::{AuditEntry, AuditReport, PerformanceAuditor, Severity};
pub use monitor::{Classification, OperationSummary, PerformanceMonitor, PerformanceRecord};
pub use store::{FilePerfStore, MemoryPerfStore, PerfStore};
