//! Run-scoped scan report.
//!
//! Every non-fatal outcome of a scan lands here: scanned and profiled
//! counters, dropped entities, and warnings or failures keyed by the entity
//! or schema they concern. The report lives for one run and is never
//! persisted as state.

use crate::models::EntityKind;
use crate::workunit::WorkUnit;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Warning recorded when an inspector returns no columns for a dataset.
pub const MISSING_COLUMN_INFO: &str = "missing column information";

/// Counters, drops, warnings and failures of one scan run.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// When the report was created
    pub started_at: DateTime<Utc>,
    /// Tables enumerated, including later-dropped ones
    pub tables_scanned: u64,
    /// Views enumerated, including later-dropped ones
    pub views_scanned: u64,
    /// Profile requests handed to the profiler
    pub entities_profiled: u64,
    /// Entities excluded by a pattern or policy
    pub filtered: Vec<String>,
    /// Non-fatal problems keyed by entity or schema
    pub warnings: BTreeMap<String, Vec<String>>,
    /// Schema and database level failures
    pub failures: BTreeMap<String, Vec<String>>,
    /// Ids of every work unit emitted, in order
    pub workunit_ids: Vec<String>,
    /// URNs retracted as stale
    pub soft_deleted_stale_entities: Vec<String>,
}

impl Default for ScanReport {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            tables_scanned: 0,
            views_scanned: 0,
            entities_profiled: 0,
            filtered: Vec::new(),
            warnings: BTreeMap::new(),
            failures: BTreeMap::new(),
            workunit_ids: Vec::new(),
            soft_deleted_stale_entities: Vec::new(),
        }
    }
}

impl ScanReport {
    /// Empty report stamped with the current time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts an enumerated table or view.
    pub fn report_entity_scanned(&mut self, name: &str, kind: EntityKind) {
        tracing::trace!("Scanned {} {}", kind.sub_type(), name);
        match kind {
            EntityKind::Table => self.tables_scanned = self.tables_scanned.saturating_add(1),
            EntityKind::View => self.views_scanned = self.views_scanned.saturating_add(1),
        }
    }

    /// Counts a planned profile request.
    pub fn report_entity_profiled(&mut self, name: &str) {
        tracing::trace!("Profiling requested for {}", name);
        self.entities_profiled = self.entities_profiled.saturating_add(1);
    }

    /// Records an entity excluded by a pattern or policy.
    pub fn report_dropped(&mut self, name: impl Into<String>) {
        let name = name.into();
        tracing::debug!("Dropped {}", name);
        self.filtered.push(name);
    }

    /// Records a warning under `key`. Identical (key, reason) pairs are kept once.
    pub fn report_warning(&mut self, key: impl Into<String>, reason: impl Into<String>) {
        let key = key.into();
        let reason = reason.into();
        tracing::warn!("{}: {}", key, reason);
        let reasons = self.warnings.entry(key).or_default();
        if !reasons.contains(&reason) {
            reasons.push(reason);
        }
    }

    /// Records a failure that ended a schema's or database's work.
    pub fn report_failure(&mut self, key: impl Into<String>, reason: impl Into<String>) {
        let key = key.into();
        let reason = reason.into();
        tracing::error!("{}: {}", key, reason);
        self.failures.entry(key).or_default().push(reason);
    }

    /// Records an emitted work unit id.
    pub fn report_workunit(&mut self, unit: &WorkUnit) {
        self.workunit_ids.push(unit.id.clone());
    }

    pub fn report_stale_entity_soft_deleted(&mut self, urn: impl Into<String>) {
        self.soft_deleted_stale_entities.push(urn.into());
    }

    /// Whether exactly this warning was recorded under `key`.
    pub fn has_warning(&self, key: &str, reason: &str) -> bool {
        self.warnings
            .get(key)
            .is_some_and(|reasons| reasons.iter().any(|r| r == reason))
    }

    /// Total warnings across all keys.
    pub fn warning_count(&self) -> usize {
        self.warnings.values().map(Vec::len).sum()
    }

    /// Total failures across all keys.
    pub fn failure_count(&self) -> usize {
        self.failures.values().map(Vec::len).sum()
    }

    /// One-line end-of-run summary.
    pub fn summary(&self) -> String {
        format!(
            "{} tables, {} views scanned; {} profiled; {} dropped; {} work units; {} stale removed; {} warnings; {} failures",
            self.tables_scanned,
            self.views_scanned,
            self.entities_profiled,
            self.filtered.len(),
            self.workunit_ids.len(),
            self.soft_deleted_stale_entities.len(),
            self.warning_count(),
            self.failure_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut report = ScanReport::new();
        report.report_entity_scanned("sales.orders", EntityKind::Table);
        report.report_entity_scanned("sales.orders_v", EntityKind::View);
        report.report_entity_scanned("sales.items", EntityKind::Table);
        report.report_entity_profiled("sales.orders");

        assert_eq!(report.tables_scanned, 2);
        assert_eq!(report.views_scanned, 1);
        assert_eq!(report.entities_profiled, 1);
    }

    #[test]
    fn test_warnings_are_keyed_and_deduplicated() {
        let mut report = ScanReport::new();
        report.report_warning("sales.orders", MISSING_COLUMN_INFO);
        report.report_warning("sales.orders", MISSING_COLUMN_INFO);
        report.report_warning("sales.orders", "unable to map type geometry");

        assert!(report.has_warning("sales.orders", MISSING_COLUMN_INFO));
        assert!(!report.has_warning("sales.items", MISSING_COLUMN_INFO));
        assert_eq!(report.warning_count(), 2);
    }

    #[test]
    fn test_summary_mentions_counts() {
        let mut report = ScanReport::new();
        report.report_dropped("tmp.*");
        report.report_failure("sales", "Tables error: timeout");
        let summary = report.summary();
        assert!(summary.contains("1 dropped"));
        assert!(summary.contains("1 failures"));
    }
}
