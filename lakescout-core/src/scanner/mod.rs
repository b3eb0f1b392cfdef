//! Crawl driver producing the work-unit stream.
//!
//! A [`Scanner`] walks every database exposed by its connector, then every
//! allowed schema, then the tables, views and profiles of each schema. Each
//! step yields [`WorkUnit`]s through a lazy stream; per-entity problems are
//! recorded in the [`ScanReport`] and never end the run.
//!
//! # Example
//! ```rust,no_run
//! # #[cfg(feature = "sqlite")]
//! # async fn example() -> lakescout_core::Result<()> {
//! use futures::StreamExt;
//! use lakescout_core::adapters::create_connector;
//! use lakescout_core::config::ScanConfig;
//! use lakescout_core::scanner::ScannerBuilder;
//!
//! let connector = create_connector("sqlite::memory:").await?;
//! let mut scanner = ScannerBuilder::new(connector, ScanConfig::new()).build()?;
//! {
//!     let units = scanner.work_units();
//!     futures::pin_mut!(units);
//!     while let Some(unit) = units.next().await {
//!         println!("{}", unit?.id);
//!     }
//! }
//! println!("{}", scanner.report().summary());
//! # Ok(())
//! # }
//! ```

mod containers;
mod tables;
mod views;

use crate::adapters::Connector;
use crate::config::ScanConfig;
use crate::domain::DomainTagger;
use crate::error::CrawlError;
use crate::identity::IdentityContext;
use crate::models::DatasetRecord;
use crate::profiling::{ProfilePlanner, Profiler, run_profiles};
use crate::report::ScanReport;
use crate::state::{StaleEntityTracker, StateKey, StateStore};
use crate::type_mapping::{TypeMapper, TypeMapperBuilder};
use crate::urn::{ContainerKey, make_data_platform_instance_urn, make_data_platform_urn};
use crate::workunit::{Aspect, DatasetProperties, DatasetSnapshot, WorkUnit};
use crate::Result;
use async_stream::try_stream;
use futures::Stream;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Schema currently being walked, with its container.
#[derive(Debug, Clone)]
pub(crate) struct SchemaScope {
    pub database: String,
    pub schema: String,
    pub container_urn: String,
}

/// State owned by one run: configuration, naming, type rules, report and
/// the entities reached so far.
pub(crate) struct RunContext {
    pub config: ScanConfig,
    pub identities: IdentityContext,
    pub mapper: TypeMapper,
    pub report: ScanReport,
    pub tracker: StaleEntityTracker,
}

impl RunContext {
    fn platform(&self) -> &str {
        &self.identities.platform
    }

    fn database_key(&self, database: &str) -> ContainerKey {
        ContainerKey::database(
            self.identities.platform.clone(),
            self.identities.platform_instance.clone(),
            self.identities.env.clone(),
            database,
        )
    }

    /// Records the unit in the report on its way out of the stream.
    fn emitted(&mut self, unit: WorkUnit) -> WorkUnit {
        self.report.report_workunit(&unit);
        unit
    }

    fn dataset_platform_instance(&self, urn: &str) -> Option<WorkUnit> {
        let instance = self.identities.platform_instance.as_deref()?;
        Some(WorkUnit::new(
            self.platform(),
            urn,
            Aspect::DataPlatformInstance {
                platform: make_data_platform_urn(self.platform()),
                instance: Some(make_data_platform_instance_urn(self.platform(), instance)),
            },
        ))
    }

    fn domain_unit(&self, urn: &str, name: &str) -> Option<WorkUnit> {
        DomainTagger::new(&self.config.domain).work_unit(self.platform(), urn, name)
    }

    fn container_membership(&self, urn: &str, scope: &SchemaScope) -> WorkUnit {
        WorkUnit::new(
            self.platform(),
            urn,
            Aspect::Container {
                container: scope.container_urn.clone(),
            },
        )
    }
}

/// Snapshot aspect for a dataset record: status, properties and schema.
fn snapshot_aspect(record: &DatasetRecord, display_name: &str) -> Aspect {
    Aspect::DatasetSnapshot(DatasetSnapshot {
        removed: false,
        properties: DatasetProperties {
            name: display_name.to_string(),
            description: record.description.clone(),
            custom_properties: record.properties.clone(),
        },
        schema: record.schema.clone(),
    })
}

/// Builder for [`Scanner`].
pub struct ScannerBuilder {
    connector: Box<dyn Connector>,
    config: ScanConfig,
    profiler: Option<Arc<dyn Profiler>>,
    state_store: Option<Arc<dyn StateStore>>,
    run_id: Option<Uuid>,
}

impl ScannerBuilder {
    /// Builder over a connector and scan configuration.
    pub fn new(connector: Box<dyn Connector>, config: ScanConfig) -> Self {
        Self {
            connector,
            config,
            profiler: None,
            state_store: None,
            run_id: None,
        }
    }

    /// Overrides the connector's own profiler.
    pub fn with_profiler(mut self, profiler: Arc<dyn Profiler>) -> Self {
        self.profiler = Some(profiler);
        self
    }

    /// Store for run state; required when stateful ingestion is enabled.
    pub fn with_state_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.state_store = Some(store);
        self
    }

    /// Fixes the run id; a random one is used otherwise.
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Validates the configuration and freezes the type rules for the run.
    ///
    /// # Errors
    /// Returns a configuration error for invalid settings, or when stateful
    /// ingestion is enabled without a state store.
    pub fn build(self) -> Result<Scanner> {
        self.config.validate()?;

        if self.config.stateful_ingestion.enabled && self.state_store.is_none() {
            return Err(CrawlError::configuration(
                "stateful_ingestion.enabled requires a state store",
            ));
        }

        let mapper = self.connector.register_types(TypeMapperBuilder::new())?.build();
        let profiler = self.profiler.or_else(|| self.connector.profiler());
        let run_id = self.run_id.unwrap_or_else(Uuid::new_v4);
        let identities = IdentityContext::new(
            self.connector.platform(),
            self.config.platform_instance.clone(),
            self.config.env.clone(),
        );
        let state_key = StateKey::new(
            self.connector.platform(),
            self.config.platform_instance.clone(),
            self.connector.source_id(),
        );

        Ok(Scanner {
            connector: self.connector,
            profiler,
            state_store: self.state_store,
            state_key,
            run_id,
            run: RunContext {
                config: self.config,
                identities,
                mapper,
                report: ScanReport::new(),
                tracker: StaleEntityTracker::new(run_id, None),
            },
        })
    }
}

/// One metadata scan over one connector.
pub struct Scanner {
    connector: Box<dyn Connector>,
    profiler: Option<Arc<dyn Profiler>>,
    state_store: Option<Arc<dyn StateStore>>,
    state_key: StateKey,
    run_id: Uuid,
    run: RunContext,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("platform", &self.connector.platform())
            .field("state_key", &self.state_key)
            .field("run_id", &self.run_id)
            .finish_non_exhaustive()
    }
}

impl Scanner {
    /// Id recorded in the state saved by this run.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Key the run state is loaded from and saved under.
    pub fn state_key(&self) -> &StateKey {
        &self.state_key
    }

    /// Report of the run so far.
    pub fn report(&self) -> &ScanReport {
        &self.run.report
    }

    /// Consumes the scanner, returning its report.
    pub fn into_report(self) -> ScanReport {
        self.run.report
    }

    fn stateful(&self) -> Option<Arc<dyn StateStore>> {
        if self.run.config.stateful_ingestion.enabled {
            self.state_store.clone()
        } else {
            None
        }
    }

    /// Lazily walks the source and yields work units in emission order.
    ///
    /// An `Err` item is fatal and is always the last item. Dropping the
    /// stream early abandons the run without saving state.
    pub fn work_units(&mut self) -> impl Stream<Item = Result<WorkUnit>> + '_ {
        try_stream! {
            // Init
            self.connector.test_connection().await?;
            let store = self.stateful();
            if let Some(store) = &store {
                let previous = store.load(&self.state_key).await?;
                if previous.is_none() {
                    tracing::info!("No previous run state for {}", self.state_key.source_id);
                }
                self.run.tracker = StaleEntityTracker::new(self.run_id, previous);
            }

            let inspectors = self.connector.inspectors().await?;
            let profiling_enabled = self.run.config.profiling.enabled;
            if profiling_enabled && self.profiler.is_none() {
                tracing::warn!(
                    "Profiling is enabled but {} provides no profiler",
                    self.run.platform()
                );
            }

            // DatabaseLoop
            for inspector in inspectors {
                let inspector = inspector.as_ref();
                let database = inspector.database_name().await?;
                tracing::info!("Scanning database {}", database);
                let db_key = self.run.database_key(&database);

                for unit in self.run.database_container(inspector, &db_key).await {
                    yield self.run.emitted(unit);
                }

                let schemas = match inspector.schema_names().await {
                    Ok(schemas) => schemas,
                    Err(e) => {
                        self.run.report.report_failure(&database, format!("Schemas error: {e}"));
                        continue;
                    }
                };

                // SchemaLoop
                let mut profile_requests = Vec::new();
                for schema in schemas {
                    if !self.run.config.schema_pattern.allowed(&schema) {
                        self.run.report.report_dropped(format!("{schema}.*"));
                        continue;
                    }

                    let (scope, units) = self.run.schema_container(inspector, &db_key, &schema).await;
                    for unit in units {
                        yield self.run.emitted(unit);
                    }

                    if self.run.config.include_tables {
                        match inspector.table_names(&schema).await {
                            Ok(tables) => {
                                let mut seen = HashSet::new();
                                for table in tables {
                                    for unit in self.run.table_entry(inspector, &scope, &table, &mut seen).await {
                                        yield self.run.emitted(unit);
                                    }
                                }
                            }
                            Err(e) => self.run.report.report_failure(&schema, format!("Tables error: {e}")),
                        }
                    }

                    if self.run.config.include_views {
                        match inspector.view_names(&schema).await {
                            Ok(views) => {
                                for view in views {
                                    for unit in self.run.view_entry(inspector, &scope, &view).await {
                                        yield self.run.emitted(unit);
                                    }
                                }
                            }
                            Err(e) => self.run.report.report_failure(&schema, format!("Views error: {e}")),
                        }
                    }

                    if profiling_enabled && self.profiler.is_some() {
                        let run = &mut self.run;
                        let planner = ProfilePlanner::new(&run.config, &run.identities);
                        match planner
                            .plan_schema(inspector, &database, &schema, chrono::Utc::now(), &mut run.report)
                            .await
                        {
                            Ok(requests) => profile_requests.extend(requests),
                            Err(e) => run.report.report_failure(&schema, format!("Profiling error: {e}")),
                        }
                    }
                }

                // ProfileLoop
                let profiler = self.profiler.clone().filter(|_| !profile_requests.is_empty());
                if let Some(profiler) = profiler {
                    let max_workers = self.run.config.profiling.max_workers;
                    let platform = self.run.identities.platform.clone();
                    let units = run_profiles(
                        profiler.as_ref(),
                        &platform,
                        profile_requests,
                        max_workers,
                        &mut self.run.report,
                    )
                    .await;
                    for unit in units {
                        yield self.run.emitted(unit);
                    }
                }
            }

            // Finalize
            if let Some(store) = &store {
                if self.run.config.stateful_ingestion.remove_stale_metadata {
                    for urn in self.run.tracker.stale_urns() {
                        tracing::info!("Soft-deleting stale entity {}", urn);
                        self.run.report.report_stale_entity_soft_deleted(&urn);
                        let unit = WorkUnit::retraction(self.run.platform(), urn);
                        yield self.run.emitted(unit);
                    }
                }

                let tracker = std::mem::replace(
                    &mut self.run.tracker,
                    StaleEntityTracker::new(self.run_id, None),
                );
                let state = tracker.into_state();
                store.save(&self.state_key, &state).await?;
            }

            tracing::info!("Scan finished: {}", self.run.report.summary());
        }
    }

    /// Drains [`Self::work_units`] into a vector.
    pub async fn collect_work_units(&mut self) -> Result<Vec<WorkUnit>> {
        use futures::TryStreamExt;
        self.work_units().try_collect().await
    }
}
