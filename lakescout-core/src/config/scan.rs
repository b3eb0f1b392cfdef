//! Scan configuration.
//!
//! This module provides the `ScanConfig` struct, loaded from a JSON recipe
//! or assembled with builder methods, and validated before a scan starts.

use super::{AllowDenyPattern, DomainRules, ProfilingConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Stale-entity removal settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatefulIngestionConfig {
    /// Load the previous run's entity set and persist this run's
    pub enabled: bool,
    /// Emit retractions for entities missing from this run
    pub remove_stale_metadata: bool,
}

impl Default for StatefulIngestionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            remove_stale_metadata: true,
        }
    }
}

/// Configuration for one metadata scan.
///
/// `view_pattern` falls back to `table_pattern` when it is not given, so a
/// table filter also governs views unless views are filtered explicitly.
///
/// # Example
/// ```rust
/// use lakescout_core::config::{AllowDenyPattern, ScanConfig};
///
/// let config = ScanConfig::new()
///     .with_table_pattern(AllowDenyPattern::deny_only(vec![".*\\.tmp_.*".into()]).unwrap())
///     .with_platform_instance("east");
///
/// assert!(config.validate().is_ok());
/// assert!(!config.view_pattern().allowed("sales.tmp_view"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Filter over schema names
    pub schema_pattern: AllowDenyPattern,
    /// Filter over `schema.table` identifiers
    pub table_pattern: AllowDenyPattern,
    /// Filter over views; falls back to `table_pattern`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_pattern: Option<AllowDenyPattern>,
    /// Additional filter over tables to profile
    pub profile_pattern: AllowDenyPattern,
    /// Ordered label to pattern map; the last matching label wins
    pub domain: DomainRules,
    /// Walk tables
    pub include_tables: bool,
    /// Walk views
    pub include_views: bool,
    /// Emit a lineage edge from the table to its storage location
    pub include_table_location_lineage: bool,
    pub profiling: ProfilingConfig,
    /// Instance embedded in dataset names and container GUIDs
    pub platform_instance: Option<String>,
    /// Environment embedded in every URN
    pub env: String,
    /// Stale-entity removal across runs
    pub stateful_ingestion: StatefulIngestionConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            schema_pattern: AllowDenyPattern::allow_all(),
            table_pattern: AllowDenyPattern::allow_all(),
            view_pattern: None,
            profile_pattern: AllowDenyPattern::allow_all(),
            domain: DomainRules::new(),
            include_tables: true,
            include_views: true,
            include_table_location_lineage: true,
            profiling: ProfilingConfig::default(),
            platform_instance: None,
            env: "PROD".to_string(),
            stateful_ingestion: StatefulIngestionConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Default configuration: everything allowed, environment `PROD`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates a JSON recipe file.
    pub async fn from_file(path: &Path) -> crate::Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            crate::error::CrawlError::io(format!("Failed to read {}", path.display()), e)
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            crate::error::CrawlError::serialization(
                format!("Failed to parse {}", path.display()),
                e,
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the scan configuration.
    ///
    /// # Errors
    /// Returns error if configuration values are invalid
    pub fn validate(&self) -> crate::Result<()> {
        if self.env.trim().is_empty() {
            return Err(crate::error::CrawlError::configuration(
                "env cannot be empty",
            ));
        }

        if let Some(instance) = &self.platform_instance
            && instance.trim().is_empty()
        {
            return Err(crate::error::CrawlError::configuration(
                "platform_instance cannot be empty when set",
            ));
        }

        self.profiling.validate()?;

        Ok(())
    }

    /// Effective view filter.
    pub fn view_pattern(&self) -> &AllowDenyPattern {
        self.view_pattern.as_ref().unwrap_or(&self.table_pattern)
    }

    /// Sets the schema filter.
    pub fn with_schema_pattern(mut self, pattern: AllowDenyPattern) -> Self {
        self.schema_pattern = pattern;
        self
    }

    /// Sets the table filter, also used for views unless overridden.
    pub fn with_table_pattern(mut self, pattern: AllowDenyPattern) -> Self {
        self.table_pattern = pattern;
        self
    }

    /// Sets a view filter distinct from the table filter.
    pub fn with_view_pattern(mut self, pattern: AllowDenyPattern) -> Self {
        self.view_pattern = Some(pattern);
        self
    }

    pub fn with_profile_pattern(mut self, pattern: AllowDenyPattern) -> Self {
        self.profile_pattern = pattern;
        self
    }

    /// Sets the ordered domain rules.
    pub fn with_domain(mut self, domain: DomainRules) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_tables(mut self, include: bool) -> Self {
        self.include_tables = include;
        self
    }

    pub fn with_views(mut self, include: bool) -> Self {
        self.include_views = include;
        self
    }

    /// Toggles lineage from tables to their storage location.
    pub fn with_location_lineage(mut self, include: bool) -> Self {
        self.include_table_location_lineage = include;
        self
    }

    pub fn with_profiling(mut self, profiling: ProfilingConfig) -> Self {
        self.profiling = profiling;
        self
    }

    /// Sets the platform instance.
    pub fn with_platform_instance(mut self, instance: impl Into<String>) -> Self {
        self.platform_instance = Some(instance.into());
        self
    }

    /// Sets the environment.
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = env.into();
        self
    }

    pub fn with_stateful_ingestion(mut self, stateful: StatefulIngestionConfig) -> Self {
        self.stateful_ingestion = stateful;
        self
    }
}
