//! Report output for scan results.

use lakescout_core::{CrawlError, Result, ScanReport};
use std::path::Path;

/// Writes the scan report as pretty-printed JSON.
pub async fn write_report(report: &ScanReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| CrawlError::serialization("Failed to serialize scan report", e))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| CrawlError::io(format!("Failed to write to {}", path.display()), e))?;
    Ok(())
}

/// Human-readable end-of-run lines for stdout.
pub fn summary_lines(report: &ScanReport, output: &Path, units_written: u64) -> Vec<String> {
    let mut lines = vec![
        "Metadata scan completed".to_string(),
        format!("Output: {} ({} work units)", output.display(), units_written),
        format!("Tables: {}", report.tables_scanned),
        format!("Views: {}", report.views_scanned),
    ];
    if report.entities_profiled > 0 {
        lines.push(format!("Profiled: {}", report.entities_profiled));
    }
    if !report.filtered.is_empty() {
        lines.push(format!("Dropped: {}", report.filtered.len()));
    }
    if !report.soft_deleted_stale_entities.is_empty() {
        lines.push(format!(
            "Stale entities removed: {}",
            report.soft_deleted_stale_entities.len()
        ));
    }
    if report.warning_count() > 0 || report.failure_count() > 0 {
        lines.push(format!(
            "Warnings: {}, failures: {}",
            report.warning_count(),
            report.failure_count()
        ));
    }
    lines
}
