//! SQLite dialect.
//!
//! # Module Structure
//! - `connection`: Connection string parsing and pool creation
//! - `type_mapping`: SQLite affinity rules for the type mapper
//! - `schema_collection`: Introspection via `sqlite_master` and PRAGMAs
//! - `profiling`: Row, null and distinct counts over plain SQL
//!
//! Every attached database (`main` plus anything `ATTACH`ed) is exposed as
//! a schema; the file name is the database name.
//!
//! # Security Guarantees
//! - All operations are read-only (SELECT/PRAGMA only)
//! - File paths are validated
//! - No network access required

pub mod connection;
pub mod profiling;
pub mod schema_collection;
pub mod type_mapping;

#[cfg(test)]
mod tests;

use super::{Connector, Inspector};
use crate::config::ConnectionConfig;
use crate::profiling::Profiler;
use crate::type_mapping::TypeMapperBuilder;
use crate::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;

pub use profiling::SqliteProfiler;
pub use schema_collection::SqliteInspector;
pub use type_mapping::register_sqlite_types;

/// Quotes an identifier for SQLite, doubling embedded quotes.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quotes a string literal for SQLite, doubling embedded quotes.
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// SQLite connector over a small read-only pool.
pub struct SqliteConnector {
    pub pool: SqlitePool,
    pub config: ConnectionConfig,
    /// Original connection string (kept for reference, public for test access)
    pub connection_string: String,
}

impl std::fmt::Debug for SqliteConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnector")
            .field("config", &self.config)
            .field("is_in_memory", &self.is_in_memory())
            .finish_non_exhaustive()
    }
}

impl SqliteConnector {
    fn database_name(&self) -> String {
        self.config
            .database
            .clone()
            .unwrap_or_else(|| "main".to_string())
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    fn platform(&self) -> &str {
        "sqlite"
    }

    fn source_id(&self) -> String {
        self.database_name()
    }

    fn register_types(&self, builder: TypeMapperBuilder) -> Result<TypeMapperBuilder> {
        register_sqlite_types(builder)
    }

    async fn test_connection(&self) -> Result<()> {
        let connectivity: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| crate::error::CrawlError::connection_failed("SQLite connectivity test", e))?;

        if connectivity != 1 {
            return Err(crate::error::CrawlError::configuration(
                "Basic connectivity test failed: unexpected result",
            ));
        }

        // sqlite_master must be readable for introspection
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sqlite_master")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                crate::error::CrawlError::connection_failed("Cannot access sqlite_master", e)
            })?;

        Ok(())
    }

    async fn inspectors(&self) -> Result<Vec<Box<dyn Inspector>>> {
        Ok(vec![Box::new(SqliteInspector::new(
            self.pool.clone(),
            self.database_name(),
        ))])
    }

    fn profiler(&self) -> Option<Arc<dyn Profiler>> {
        Some(Arc::new(SqliteProfiler::new(self.pool.clone())))
    }
}
