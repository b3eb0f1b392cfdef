//! Core metadata extraction pipeline for lakescout.
//!
//! This crate turns the catalog of a SQL warehouse into an ordered stream of
//! metadata work units: containers for databases and schemas, dataset
//! snapshots for tables and views, lineage, domains, profiles and, when
//! stateful ingestion is enabled, retractions for entities that disappeared
//! since the previous run.
//!
//! # Guarantees
//! - All source operations are read-only introspection or aggregate SELECTs
//! - Credentials never appear in identifiers, state keys or logs
//! - Per-entity failures are recorded in the [`report::ScanReport`] and never
//!   abort the run
//!
//! # Architecture
//! - [`adapters`]: dialect connectors and inspectors behind async traits
//! - [`scanner`]: the crawl driver producing the work-unit stream
//! - [`type_mapping`], [`identity`], [`domain`]: per-run rule sets
//! - [`state`]: stale-entity tracking across runs
//! - [`profiling`]: profile request planning and execution

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod identity;
pub mod logging;
pub mod models;
pub mod profiling;
pub mod report;
pub mod scanner;
pub mod sink;
pub mod state;
pub mod type_mapping;
pub mod urn;
pub mod workunit;

// Re-export commonly used types
pub use adapters::{Connector, Inspector, create_connector};
pub use config::{AllowDenyPattern, ConnectionConfig, ScanConfig};
pub use error::{CrawlError, Result};
pub use logging::init_logging;
pub use models::{CanonicalType, ColumnInfo, DatasetIdentity, EntityKind};
pub use report::ScanReport;
pub use scanner::{Scanner, ScannerBuilder};
pub use workunit::{Aspect, WorkUnit};
