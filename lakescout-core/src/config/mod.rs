//! Configuration types.
//!
//! - `ScanConfig`: filters, include flags, profiling, domains, state
//! - `AllowDenyPattern`: anchored regex allow/deny filter
//! - `DomainRules`: ordered domain label to pattern map
//! - `ProfilingConfig`: profiling gates and worker bound
//! - `ConnectionConfig`: host/port/database for dialect connectors

mod connection;
mod domain;
mod pattern;
mod profiling;
mod scan;

pub use connection::ConnectionConfig;
pub use domain::DomainRules;
pub use pattern::{AllowDenyPattern, PatternSpec};
pub use profiling::ProfilingConfig;
pub use scan::{ScanConfig, StatefulIngestionConfig};
