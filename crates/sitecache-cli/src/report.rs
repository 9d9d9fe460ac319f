//! Plain-text rendering of data-layer reports.

use std::collections::BTreeMap;
use std::fmt::Write;

use sitecache_core::perf::{AuditReport, OperationSummary};
use sitecache_core::{BatchResult, ConnectivitySummary, EndpointProbeResult, FeatureCheck};

use crate::format::{format_bytes, format_duration_ms, truncate_string};

/// Width of the description column
const DESCRIPTION_WIDTH: usize = 28;

fn status_mark(success: bool) -> &'static str {
    if success {
        "✓"
    } else {
        "✗"
    }
}

fn probe_line(out: &mut String, result: &EndpointProbeResult) {
    let _ = write!(
        out,
        "  {} {:<width$} {:<34} {:>8} {:>10}",
        status_mark(result.success),
        truncate_string(&result.description, DESCRIPTION_WIDTH),
        result.path,
        format_duration_ms(result.duration_ms),
        format_bytes(result.payload_size),
        width = DESCRIPTION_WIDTH,
    );
    if let Some(ref error) = result.error {
        let _ = write!(out, "  {}", error);
    }
    out.push('\n');
}

pub fn render_connectivity(summary: &ConnectivitySummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Connectivity: {}/{} endpoints answered in {}",
        summary.succeeded(),
        summary.total(),
        format_duration_ms(summary.elapsed_ms)
    );
    let _ = writeln!(
        out,
        "  admin:       {} ok, {} failed (of {})",
        summary.admin_success, summary.admin_failed, summary.total_admin
    );
    let _ = writeln!(
        out,
        "  siteManager: {} ok, {} failed (of {})",
        summary.site_manager_success, summary.site_manager_failed, summary.total_site_manager
    );
    out.push('\n');

    for result in &summary.results {
        probe_line(&mut out, result);
    }

    if summary.is_down() {
        out.push_str("\nBackend unreachable: no endpoint answered.\n");
    } else if !summary.failed.is_empty() {
        let _ = writeln!(out, "\nFailed ({}):", summary.failed.len());
        for result in &summary.failed {
            let _ = writeln!(out, "  {} [{}]", result.path, result.role);
        }
    }

    if !summary.slow.is_empty() {
        let _ = writeln!(out, "\nSlow ({}):", summary.slow.len());
        for result in &summary.slow {
            let _ = writeln!(out, "  {} {}", result.path, format_duration_ms(result.duration_ms));
        }
    }
    out
}

pub fn render_feature(check: &FeatureCheck) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}: {} in {}",
        status_mark(check.success),
        check.feature,
        if check.success { "working" } else { "degraded" },
        format_duration_ms(check.total_duration_ms)
    );
    for result in &check.results {
        probe_line(&mut out, result);
    }
    out
}

/// Stock dashboard: primary first, then the secondary routes.
pub fn render_dashboard(results: &[BatchResult]) -> String {
    let mut out = String::new();
    for result in results {
        let _ = write!(
            out,
            "{} {:<34} {:>8}",
            status_mark(result.success),
            result.url,
            format_duration_ms(result.duration_ms)
        );
        if result.success {
            let _ = writeln!(out, " {:>10}", format_bytes(result.payload_size()));
        } else if let Some(message) = result.failure_message() {
            let _ = writeln!(out, "  {}", message);
        }
    }
    out
}

pub fn render_perf(summary: &BTreeMap<String, OperationSummary>) -> String {
    if summary.is_empty() {
        return "No performance samples recorded.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<36} {:>9} {:>7} {:>5} {:>6} {:>5}",
        "operation", "avg", "samples", "fast", "medium", "slow"
    );
    for (operation, stats) in summary {
        let _ = writeln!(
            out,
            "{:<36} {:>9} {:>7} {:>5} {:>6} {:>5}",
            truncate_string(operation, 36),
            format_duration_ms(stats.avg_duration_ms.round() as u64),
            stats.total_records,
            stats.fast_count,
            stats.medium_count,
            stats.slow_count
        );
    }
    out
}

pub fn render_audit(report: &AuditReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Audited {} operations: {} slow, {} very slow",
        report.observed, report.slow_count, report.very_slow_count
    );
    if report.is_clean() {
        out.push_str("All operations within budget.\n");
        return out;
    }
    for entry in &report.entries {
        let _ = writeln!(
            out,
            "  {:<9} {:>8}  {}  {}",
            entry.severity.label(),
            format_duration_ms(entry.duration_ms),
            entry.operation,
            entry.timestamp.format("%H:%M:%S")
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecache_core::perf::{AuditEntry, Severity};
    use sitecache_core::probe::EndpointRole;

    fn probe(path: &str, role: EndpointRole, success: bool, ms: u64) -> EndpointProbeResult {
        EndpointProbeResult {
            path: path.to_string(),
            description: path.trim_start_matches("/api/").to_string(),
            role,
            success,
            duration_ms: ms,
            error: if success { None } else { Some("network error".to_string()) },
            payload_size: 10,
        }
    }

    #[test]
    fn test_connectivity_report_lists_failures_and_slow() {
        let failed = probe("/api/site-manager/stocks", EndpointRole::SiteManager, false, 40);
        let slow = probe("/api/reports/summary", EndpointRole::Admin, true, 3200);
        let summary = ConnectivitySummary {
            total_admin: 1,
            total_site_manager: 1,
            admin_success: 1,
            admin_failed: 0,
            site_manager_success: 0,
            site_manager_failed: 1,
            results: vec![slow.clone(), failed.clone()],
            failed: vec![failed],
            slow: vec![slow],
            elapsed_ms: 3210,
        };

        let text = render_connectivity(&summary);
        assert!(text.starts_with("Connectivity: 1/2 endpoints answered in 3.2s"));
        assert!(text.contains("Failed (1):\n  /api/site-manager/stocks [siteManager]"));
        assert!(text.contains("Slow (1):\n  /api/reports/summary 3.2s"));
        assert!(text.contains("network error"));
    }

    #[test]
    fn test_dashboard_report_flags_timeouts() {
        let results = vec![
            BatchResult {
                url: "/api/stocks".to_string(),
                success: false,
                data: None,
                error: Some("timeout".to_string()),
                duration_ms: 15000,
            },
            BatchResult {
                url: "/api/projects".to_string(),
                success: true,
                data: Some(serde_json::json!([])),
                error: None,
                duration_ms: 120,
            },
        ];
        let text = render_dashboard(&results);
        assert!(text.contains("taking longer than usual"));
        assert!(text.contains("✓ /api/projects"));
    }

    #[test]
    fn test_perf_report_empty() {
        assert_eq!(render_perf(&BTreeMap::new()), "No performance samples recorded.\n");
    }

    #[test]
    fn test_audit_report_clean_and_dirty() {
        let clean = AuditReport {
            observed: 4,
            slow_count: 0,
            very_slow_count: 0,
            entries: vec![],
        };
        assert!(render_audit(&clean).contains("All operations within budget."));

        let dirty = AuditReport {
            observed: 4,
            slow_count: 0,
            very_slow_count: 1,
            entries: vec![AuditEntry {
                operation: "/api/stocks".to_string(),
                duration_ms: 7000,
                severity: Severity::VerySlow,
                timestamp: chrono::Utc::now(),
            }],
        };
        let text = render_audit(&dirty);
        assert!(text.contains("very slow"));
        assert!(text.contains("/api/stocks"));
    }
}
