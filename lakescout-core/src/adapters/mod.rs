//! Dialect capability contract and connector factory.
//!
//! A dialect plugs into the scanner through two traits:
//!
//! - [`Connector`]: owns the connection to a source, names the platform,
//!   contributes type rules and hands out one [`Inspector`] per database.
//! - [`Inspector`]: the per-run introspection capabilities. Every method
//!   beyond the required listing/column calls has a documented default, and
//!   "not supported" is reported as [`CrawlError::Unsupported`] rather than
//!   swallowed, so the scanner can apply the right fallback.
//!
//! # Module Structure
//! - `sqlite`: SQLite dialect over `sqlx`
//! - `impala`: Impala/Hive dialect over a pluggable [`impala::HiveClient`]

use crate::error::CrawlError;
use crate::identity::{DefaultIdentifierNormalizer, IdentifierNormalizer};
use crate::models::{ColumnInfo, ForeignKeyRecord, PrimaryKey, TableProperties};
use crate::profiling::Profiler;
use crate::type_mapping::TypeMapperBuilder;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Supported source dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// SQLite via `sqlx`
    Sqlite,
    /// Impala or Hive over a HiveServer2 client
    Impala,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::Impala => write!(f, "impala"),
        }
    }
}

/// Introspection capabilities bound to one connection for one run.
///
/// # Object Safety
/// This trait is object-safe; the scanner holds `Box<dyn Inspector>`.
#[async_trait]
pub trait Inspector: Send + Sync {
    /// Dialect name used in unsupported-capability errors.
    fn dialect(&self) -> &str;

    /// Naming rules for datasets produced by this inspector.
    fn naming(&self) -> &dyn IdentifierNormalizer {
        &DefaultIdentifierNormalizer
    }

    /// Current database name; the root namespace of the run.
    ///
    /// # Errors
    /// Failure here is fatal to the run.
    async fn database_name(&self) -> Result<String>;

    /// Schemas of the current database, in source order.
    async fn schema_names(&self) -> Result<Vec<String>>;

    /// Table names in `schema`.
    ///
    /// # Errors
    /// A failure here is reported against the schema only.
    async fn table_names(&self, schema: &str) -> Result<Vec<String>>;

    /// View names in `schema`.
    async fn view_names(&self, schema: &str) -> Result<Vec<String>>;

    /// Columns in declaration order. Empty when the source has no column
    /// information; errors are reserved for failed lookups.
    async fn columns(&self, table: &str, schema: &str) -> Result<Vec<ColumnInfo>>;

    /// Primary key of the table; `None` when it has none.
    async fn primary_key(&self, _table: &str, _schema: &str) -> Result<Option<PrimaryKey>> {
        Ok(None)
    }

    /// Foreign keys of the table. The scanner degrades a failure to no keys.
    async fn foreign_keys(&self, _table: &str, _schema: &str) -> Result<Vec<ForeignKeyRecord>> {
        Ok(Vec::new())
    }

    /// Description, properties and storage location.
    ///
    /// Unsupported is a silent outcome meaning no properties.
    async fn table_comment_and_properties(
        &self,
        _table: &str,
        _schema: &str,
    ) -> Result<TableProperties> {
        Err(CrawlError::unsupported("table properties", self.dialect()))
    }

    /// SQL text of the view; unsupported degrades to an empty definition.
    async fn view_definition(&self, _view: &str, _schema: &str) -> Result<String> {
        Err(CrawlError::unsupported("view definitions", self.dialect()))
    }

    /// Extra properties for the database container.
    async fn database_properties(&self, _database: &str) -> Result<BTreeMap<String, String>> {
        Ok(BTreeMap::new())
    }

    /// Extra properties for a schema container.
    async fn schema_properties(
        &self,
        _database: &str,
        _schema: &str,
    ) -> Result<BTreeMap<String, String>> {
        Ok(BTreeMap::new())
    }

    /// Column name to tag list for a table.
    async fn extra_tags(
        &self,
        _schema: &str,
        _table: &str,
    ) -> Result<BTreeMap<String, Vec<String>>> {
        Ok(BTreeMap::new())
    }

    /// Identifiers of tables worth profiling, optionally only those updated
    /// after `threshold`. Unsupported means every table is a candidate.
    async fn profile_candidates(
        &self,
        _threshold: Option<DateTime<Utc>>,
        _schema: &str,
    ) -> Result<Vec<String>> {
        Err(CrawlError::unsupported("profile candidates", self.dialect()))
    }

    /// Whether the table is partitioned; `None` when unknown.
    async fn is_table_partitioned(&self, _schema: &str, _table: &str) -> Result<Option<bool>> {
        Ok(None)
    }

    /// Partition to profile and the custom query that scopes the profile to it.
    async fn partition_profiler_query(
        &self,
        _schema: &str,
        _table: &str,
        _partition_datetime: Option<DateTime<Utc>>,
    ) -> Result<(Option<String>, Option<String>)> {
        Ok((None, None))
    }
}

/// Source connection able to produce inspectors for a scan run.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Platform name embedded in every URN, e.g. `impala`.
    fn platform(&self) -> &str;

    /// Stable identity of the source, used to key persisted run state.
    fn source_id(&self) -> String;

    /// Adds dialect type rules ahead of the base rules.
    fn register_types(&self, builder: TypeMapperBuilder) -> Result<TypeMapperBuilder> {
        Ok(builder)
    }

    /// Verifies connectivity without scanning.
    async fn test_connection(&self) -> Result<()>;

    /// One inspector per database to scan.
    ///
    /// # Errors
    /// Failure here is fatal to the run.
    async fn inspectors(&self) -> Result<Vec<Box<dyn Inspector>>>;

    /// Profiler shipped with the dialect, if any.
    fn profiler(&self) -> Option<Arc<dyn Profiler>> {
        None
    }
}

/// Factory function to create a connector from a connection string.
///
/// # Errors
/// Returns error if:
/// - Connection string format is unrecognized
/// - The dialect is not compiled in or needs an embedded transport
/// - The connection cannot be opened
pub async fn create_connector(connection_string: &str) -> Result<Box<dyn Connector>> {
    match detect_dialect(connection_string)? {
        #[cfg(feature = "sqlite")]
        Dialect::Sqlite => {
            let connector = sqlite::SqliteConnector::new(connection_string).await?;
            Ok(Box::new(connector))
        }
        #[cfg(not(feature = "sqlite"))]
        Dialect::Sqlite => Err(CrawlError::unsupported(
            "SQLite connector",
            "Compile with --features sqlite to enable SQLite support",
        )),
        Dialect::Impala => Err(CrawlError::unsupported(
            "URL-based connection",
            "impala: construct ImpalaConnector with a HiveClient transport",
        )),
    }
}

/// Detects the dialect from a connection string.
///
/// # Errors
/// Returns error if connection string format is unrecognized
pub fn detect_dialect(connection_string: &str) -> Result<Dialect> {
    if connection_string.starts_with("sqlite:")
        || connection_string == ":memory:"
        || connection_string.ends_with(".db")
        || connection_string.ends_with(".sqlite")
        || connection_string.ends_with(".sqlite3")
    {
        Ok(Dialect::Sqlite)
    } else if connection_string.starts_with("impala://")
        || connection_string.starts_with("hive://")
    {
        Ok(Dialect::Impala)
    } else {
        Err(CrawlError::configuration(
            "Unrecognized connection string format",
        ))
    }
}

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "impala")]
pub mod impala;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_dialect() {
        assert_eq!(
            detect_dialect("sqlite:///path/to/db.sqlite").unwrap(),
            Dialect::Sqlite
        );
        assert_eq!(detect_dialect("/path/to/db.db").unwrap(), Dialect::Sqlite);
        assert_eq!(detect_dialect(":memory:").unwrap(), Dialect::Sqlite);
        assert_eq!(detect_dialect("sqlite::memory:").unwrap(), Dialect::Sqlite);
        assert_eq!(
            detect_dialect("impala://analyst@warehouse:21050/sales").unwrap(),
            Dialect::Impala
        );
        assert_eq!(detect_dialect("hive://warehouse/sales").unwrap(), Dialect::Impala);
        assert!(detect_dialect("postgres://localhost/db").is_err());
    }

    #[tokio::test]
    async fn test_impala_urls_need_embedded_transport() {
        let result = create_connector("impala://warehouse:21050/sales").await;
        assert!(matches!(result, Err(e) if e.is_unsupported()));
    }

    struct Bare;

    #[async_trait]
    impl Inspector for Bare {
        fn dialect(&self) -> &str {
            "bare"
        }
        async fn database_name(&self) -> Result<String> {
            Ok("db".into())
        }
        async fn schema_names(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        async fn table_names(&self, _schema: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        async fn view_names(&self, _schema: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        async fn columns(&self, _table: &str, _schema: &str) -> Result<Vec<ColumnInfo>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_inspector_defaults() {
        let inspector = Bare;
        assert_eq!(inspector.primary_key("t", "s").await.unwrap(), None);
        assert!(inspector.foreign_keys("t", "s").await.unwrap().is_empty());
        assert!(
            inspector
                .table_comment_and_properties("t", "s")
                .await
                .unwrap_err()
                .is_unsupported()
        );
        assert!(inspector.view_definition("v", "s").await.unwrap_err().is_unsupported());
        assert!(
            inspector
                .profile_candidates(None, "s")
                .await
                .unwrap_err()
                .is_unsupported()
        );
        assert_eq!(inspector.is_table_partitioned("s", "t").await.unwrap(), None);
        assert_eq!(
            inspector.partition_profiler_query("s", "t", None).await.unwrap(),
            (None, None)
        );
        assert_eq!(inspector.naming().identifier("s", "t"), "s.t");
    }
}
