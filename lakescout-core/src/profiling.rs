//! Profiling request planning and bounded execution.
//!
//! Planning runs per schema inside the scan walk; execution runs once per
//! database after its schemas are walked, with at most `max_workers`
//! profiler calls in flight. Results arrive in completion order.

use crate::adapters::Inspector;
use crate::config::ScanConfig;
use crate::identity::IdentityContext;
use crate::models::{DatasetIdentity, DatasetProfile};
use crate::report::{MISSING_COLUMN_INFO, ScanReport};
use crate::workunit::{Aspect, WorkUnit};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;

/// One table (or table partition) to profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRequest {
    /// Dataset the profile is attached to
    pub identity: DatasetIdentity,
    /// Schema as known to the source
    pub schema: String,
    /// Table name as known to the source
    pub table: String,
    /// Partition to profile, if the table is partitioned
    pub partition: Option<String>,
    /// Query scoping the profile to `partition`
    pub custom_sql: Option<String>,
}

/// Computes dataset statistics. `Ok(None)` means no profile was produced.
#[async_trait]
pub trait Profiler: Send + Sync {
    /// Profiles one table or partition.
    ///
    /// # Errors
    /// Errors become warnings keyed by the dataset; the batch continues.
    async fn profile(&self, request: &ProfileRequest) -> Result<Option<DatasetProfile>>;
}

/// Decides which tables of a schema get profiled.
pub struct ProfilePlanner<'a> {
    config: &'a ScanConfig,
    identities: &'a IdentityContext,
}

impl<'a> ProfilePlanner<'a> {
    /// Planner over the run's configuration and naming context.
    pub fn new(config: &'a ScanConfig, identities: &'a IdentityContext) -> Self {
        Self { config, identities }
    }

    fn is_eligible(&self, dataset_name: &str, candidates: Option<&HashSet<String>>) -> bool {
        self.config.table_pattern.allowed(dataset_name)
            && self.config.profile_pattern.allowed(dataset_name)
            && candidates.is_none_or(|c| c.contains(dataset_name))
    }

    async fn candidates(
        &self,
        inspector: &dyn Inspector,
        schema: &str,
        now: DateTime<Utc>,
        report: &mut ScanReport,
    ) -> Option<HashSet<String>> {
        let profiling = &self.config.profiling;
        if !profiling.wants_candidates() {
            return None;
        }
        let threshold = profiling.updated_since_threshold(now);
        match inspector.profile_candidates(threshold, schema).await {
            Ok(candidates) => Some(candidates.into_iter().collect()),
            Err(e) if e.is_unsupported() => {
                tracing::debug!("Profile candidates not supported for {}; using all tables", schema);
                None
            }
            Err(e) => {
                report.report_warning(schema, format!("unable to compute profile candidates: {e}"));
                None
            }
        }
    }

    /// Builds the profile requests for one schema.
    ///
    /// # Errors
    /// Returns error only if the schema's tables cannot be enumerated;
    /// per-table problems are recorded in the report.
    pub async fn plan_schema(
        &self,
        inspector: &dyn Inspector,
        database: &str,
        schema: &str,
        now: DateTime<Utc>,
        report: &mut ScanReport,
    ) -> Result<Vec<ProfileRequest>> {
        // One cutoff for the whole schema.
        let candidates = self.candidates(inspector, schema, now, report).await;
        let tables = inspector.table_names(schema).await?;
        let naming = inspector.naming();
        let mut seen = HashSet::new();
        let mut requests = Vec::new();

        for table in tables {
            let (std_schema, std_table) = naming.standardize(schema, &table);
            let dataset_name = naming.identifier(&std_schema, &std_table);

            if !self.is_eligible(&dataset_name, candidates.as_ref()) {
                if self.config.profiling.report_dropped_profiles {
                    report.report_dropped(format!("profile of {dataset_name}"));
                }
                continue;
            }

            let dataset_name = naming.normalise(&dataset_name);
            if !seen.insert(dataset_name.clone()) {
                tracing::debug!("{} has already been seen, skipping profile", dataset_name);
                continue;
            }

            if report.has_warning(&dataset_name, MISSING_COLUMN_INFO) {
                tracing::debug!("{} has no column information, skipping profile", dataset_name);
                continue;
            }

            match self
                .plan_table(inspector, database, &std_schema, &std_table, &dataset_name, report)
                .await
            {
                Ok(Some(request)) => {
                    report.report_entity_profiled(&dataset_name);
                    requests.push(request);
                }
                Ok(None) => {}
                Err(e) => report.report_warning(
                    format!("{schema}.{table}"),
                    format!("unable to plan profile: {e}"),
                ),
            }
        }

        Ok(requests)
    }

    async fn plan_table(
        &self,
        inspector: &dyn Inspector,
        database: &str,
        schema: &str,
        table: &str,
        dataset_name: &str,
        report: &mut ScanReport,
    ) -> Result<Option<ProfileRequest>> {
        let profiling = &self.config.profiling;
        let (partition, custom_sql) = inspector
            .partition_profiler_query(schema, table, profiling.partition_datetime)
            .await?;

        if partition.is_none() && inspector.is_table_partitioned(schema, table).await? == Some(true)
        {
            report.report_dropped(format!("profile of {dataset_name}"));
            report.report_warning(
                dataset_name,
                "profile skipped as partitioned table is empty or partition id was invalid",
            );
            return Ok(None);
        }

        if partition.is_some() && !profiling.partition_profiling_enabled {
            tracing::debug!(
                "{} and partition {:?} is skipped because profiling.partition_profiling_enabled is disabled",
                dataset_name,
                partition
            );
            return Ok(None);
        }

        Ok(Some(ProfileRequest {
            identity: self.identities.dataset(database, schema, dataset_name),
            schema: schema.to_string(),
            table: table.to_string(),
            partition,
            custom_sql,
        }))
    }
}

/// Runs profile requests with at most `max_workers` in flight.
///
/// Profiler errors become warnings keyed by the dataset; `None` results are
/// skipped. Output order follows completion, not request order.
pub async fn run_profiles(
    profiler: &dyn Profiler,
    platform: &str,
    requests: Vec<ProfileRequest>,
    max_workers: usize,
    report: &mut ScanReport,
) -> Vec<WorkUnit> {
    tracing::info!(
        "Profiling {} datasets with up to {} workers",
        requests.len(),
        max_workers
    );

    let results: Vec<(ProfileRequest, Result<Option<DatasetProfile>>)> = stream::iter(requests)
        .map(move |request| async move {
            let result = profiler.profile(&request).await;
            (request, result)
        })
        .buffer_unordered(max_workers.max(1))
        .collect()
        .await;

    let mut units = Vec::new();
    for (request, result) in results {
        match result {
            Ok(Some(profile)) => units.push(WorkUnit::new(
                platform,
                request.identity.urn(),
                Aspect::DatasetProfile(profile),
            )),
            Ok(None) => tracing::debug!("No profile produced for {}", request.identity.name),
            Err(e) => report.report_warning(&request.identity.name, format!("profiling failed: {e}")),
        }
    }
    units
}
