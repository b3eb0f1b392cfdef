//! Profiling configuration.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Controls which tables are profiled and how many profiles run at once.
///
/// # Example
/// ```rust
/// use lakescout_core::config::ProfilingConfig;
///
/// let config = ProfilingConfig::new()
///     .with_enabled(true)
///     .with_max_workers(8)
///     .unwrap()
///     .with_updated_since_days(7.0);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfilingConfig {
    /// Run the profiling pass
    pub enabled: bool,
    /// Maximum concurrent profiler calls (1-50)
    pub max_workers: usize,
    /// Only profile tables modified within this many days
    pub profile_if_updated_since_days: Option<f64>,
    /// Only profile tables smaller than this many gigabytes
    pub profile_table_size_limit: Option<u64>,
    /// Only profile tables with fewer rows than this
    pub profile_table_row_limit: Option<u64>,
    /// Profile the selected partition of partitioned tables
    pub partition_profiling_enabled: bool,
    /// Partition to profile; the latest partition when unset
    pub partition_datetime: Option<DateTime<Utc>>,
    /// Record tables excluded from profiling in the report's dropped list
    pub report_dropped_profiles: bool,
}

impl Default for ProfilingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_workers: 4,
            profile_if_updated_since_days: None,
            profile_table_size_limit: Some(5),
            profile_table_row_limit: Some(5_000_000),
            partition_profiling_enabled: true,
            partition_datetime: None,
            report_dropped_profiles: false,
        }
    }
}

impl ProfilingConfig {
    /// Profiling disabled, four workers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the profiling configuration.
    ///
    /// # Errors
    /// Returns error if worker count or day window are out of range
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_workers == 0 || self.max_workers > 50 {
            return Err(crate::error::CrawlError::configuration(
                "profiling.max_workers must be between 1 and 50",
            ));
        }

        if let Some(days) = self.profile_if_updated_since_days
            && !(days > 0.0 && days <= 36_500.0)
        {
            return Err(crate::error::CrawlError::configuration(
                "profiling.profile_if_updated_since_days must be within (0, 36500]",
            ));
        }

        Ok(())
    }

    /// Whether the inspector should be asked for a candidate list at all.
    pub fn wants_candidates(&self) -> bool {
        self.profile_if_updated_since_days.is_some()
            || self.profile_table_size_limit.is_some()
            || self.profile_table_row_limit.is_none()
    }

    /// Cutoff for "updated since" filtering relative to `now`.
    pub fn updated_since_threshold(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = self.profile_if_updated_since_days?;
        // Validated to at most 36500 days, well within i64 milliseconds.
        #[allow(clippy::cast_possible_truncation)]
        let millis = (days * 86_400_000.0) as i64;
        TimeDelta::try_milliseconds(millis).and_then(|delta| now.checked_sub_signed(delta))
    }

    /// Enables or disables profiling.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder method to set max workers with validation.
    pub fn with_max_workers(mut self, max_workers: usize) -> crate::Result<Self> {
        if max_workers == 0 || max_workers > 50 {
            return Err(crate::error::CrawlError::configuration(
                "profiling.max_workers must be between 1 and 50",
            ));
        }
        self.max_workers = max_workers;
        Ok(self)
    }

    /// Profiles only tables modified within `days`.
    pub fn with_updated_since_days(mut self, days: f64) -> Self {
        self.profile_if_updated_since_days = Some(days);
        self
    }

    /// Enables or disables partition profiling.
    pub fn with_partition_profiling(mut self, enabled: bool) -> Self {
        self.partition_profiling_enabled = enabled;
        self
    }

    /// Records tables excluded from profiling as dropped.
    pub fn with_report_dropped_profiles(mut self, report: bool) -> Self {
        self.report_dropped_profiles = report;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults() {
        let config = ProfilingConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.max_workers, 4);
        assert!(config.partition_profiling_enabled);
        assert!(!config.report_dropped_profiles);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_workers_bounds() {
        assert!(ProfilingConfig::new().with_max_workers(0).is_err());
        assert!(ProfilingConfig::new().with_max_workers(51).is_err());
        assert!(ProfilingConfig::new().with_max_workers(50).is_ok());

        let config = ProfilingConfig {
            max_workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_day_window_validation() {
        assert!(
            ProfilingConfig::new()
                .with_updated_since_days(-1.0)
                .validate()
                .is_err()
        );
        assert!(
            ProfilingConfig::new()
                .with_updated_since_days(0.5)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_threshold_is_now_minus_days() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let config = ProfilingConfig::new().with_updated_since_days(7.0);
        assert_eq!(
            config.updated_since_threshold(now),
            Some(Utc.with_ymd_and_hms(2024, 3, 3, 12, 0, 0).unwrap())
        );
        assert_eq!(ProfilingConfig::new().updated_since_threshold(now), None);
    }

    #[test]
    fn test_candidate_gating() {
        assert!(ProfilingConfig::default().wants_candidates());

        let config = ProfilingConfig {
            profile_table_size_limit: None,
            profile_table_row_limit: Some(10),
            ..Default::default()
        };
        assert!(!config.wants_candidates());
        assert!(config.with_updated_since_days(1.0).wants_candidates());
    }
}
