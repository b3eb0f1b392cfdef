//! Impala / Hive dialect.
//!
//! The dialect speaks SQL through a [`HiveClient`], so any transport
//! (HiveServer2 Thrift, an HTTP gateway, a recorded fixture) can back it.
//! Introspection relies on `SHOW DATABASES`, `SHOW TABLES`, `SHOW VIEWS`,
//! `DESCRIBE` and `DESCRIBE FORMATTED`.
//!
//! The Hive listing of tables also returns views, so scans against this
//! dialect usually start from [`ImpalaConnector::scan_defaults`], which
//! leaves views out.

pub mod describe;


use super::{Connector, Inspector};
use crate::config::{ConnectionConfig, ScanConfig};
use crate::error::CrawlError;
use crate::models::{CanonicalType, ColumnInfo, TableProperties};
use crate::type_mapping::{TypeMapperBuilder, TypePattern};
use crate::Result;
use async_trait::async_trait;
use describe::Row;
use std::sync::Arc;
use url::Url;

/// Default HiveServer2 port exposed by Impala daemons.
pub const DEFAULT_PORT: u16 = 21050;

/// Executes one statement and returns its rows as nullable strings.
#[async_trait]
pub trait HiveClient: Send + Sync {
    async fn query(&self, sql: &str) -> Result<Vec<Row>>;
}

/// Quotes an identifier with backticks, doubling embedded backticks.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn first_column(rows: Vec<Row>) -> Vec<String> {
    rows.into_iter()
        .filter_map(|row| row.into_iter().next().flatten())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Parses `impala://[user@]host[:port][/database]` (or `hive://`).
pub fn parse_impala_url(connection_string: &str) -> Result<ConnectionConfig> {
    let url = Url::parse(connection_string)
        .map_err(|e| CrawlError::configuration(format!("Invalid Impala URL: {}", e)))?;

    if !matches!(url.scheme(), "impala" | "hive") {
        return Err(CrawlError::configuration(
            "Connection string must use impala:// or hive:// scheme",
        ));
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| CrawlError::configuration("Impala URL is missing a host"))?;

    let mut config = ConnectionConfig::new(host.to_string())
        .with_port(url.port().unwrap_or(DEFAULT_PORT));

    let database = url.path().trim_matches('/');
    if !database.is_empty() {
        config = config.with_database(database.to_string());
    }
    if !url.username().is_empty() {
        config = config.with_username(url.username().to_string());
    }

    config.validate()?;
    Ok(config)
}

/// Impala connector over a caller-supplied [`HiveClient`].
pub struct ImpalaConnector<C> {
    client: Arc<C>,
    config: ConnectionConfig,
    storage_env: String,
}

impl<C> std::fmt::Debug for ImpalaConnector<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImpalaConnector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<C: HiveClient + 'static> ImpalaConnector<C> {
    pub fn new(client: C, config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: Arc::new(client),
            config,
            storage_env: "PROD".to_string(),
        })
    }

    /// Environment used for storage-location dataset URNs.
    pub fn with_storage_env(mut self, env: impl Into<String>) -> Self {
        self.storage_env = env.into();
        self
    }

    /// Builds the connector from an `impala://` URL.
    pub fn from_url(client: C, connection_string: &str) -> Result<Self> {
        Self::new(client, parse_impala_url(connection_string)?)
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Scan defaults for this dialect: views excluded.
    pub fn scan_defaults() -> ScanConfig {
        ScanConfig::new().with_views(false)
    }
}

#[async_trait]
impl<C: HiveClient + 'static> Connector for ImpalaConnector<C> {
    fn platform(&self) -> &str {
        "impala"
    }

    /// `host:port/database`, without credentials.
    fn source_id(&self) -> String {
        self.config.to_string()
    }

    fn register_types(&self, builder: TypeMapperBuilder) -> Result<TypeMapperBuilder> {
        Ok(builder
            .register(TypePattern::exact("date"), CanonicalType::Date)
            .register(TypePattern::exact("timestamp"), CanonicalType::Time)
            .register(TypePattern::exact("decimal"), CanonicalType::Number))
    }

    async fn test_connection(&self) -> Result<()> {
        self.client.query("SELECT 1").await.map(|_| ())
    }

    async fn inspectors(&self) -> Result<Vec<Box<dyn Inspector>>> {
        Ok(vec![Box::new(
            ImpalaInspector::new(Arc::clone(&self.client), self.config.database.clone())
                .with_storage_env(self.storage_env.clone()),
        )])
    }
}

/// Inspector over a shared [`HiveClient`].
pub struct ImpalaInspector<C> {
    client: Arc<C>,
    database: Option<String>,
    storage_env: String,
}

impl<C: HiveClient> ImpalaInspector<C> {
    pub fn new(client: Arc<C>, database: Option<String>) -> Self {
        Self {
            client,
            database,
            storage_env: "PROD".to_string(),
        }
    }

    pub fn with_storage_env(mut self, env: impl Into<String>) -> Self {
        self.storage_env = env.into();
        self
    }

    fn qualified(schema: &str, table: &str) -> String {
        format!("{}.{}", quote_identifier(schema), quote_identifier(table))
    }
}

#[async_trait]
impl<C: HiveClient + 'static> Inspector for ImpalaInspector<C> {
    fn dialect(&self) -> &str {
        "impala"
    }

    async fn database_name(&self) -> Result<String> {
        Ok(self
            .database
            .clone()
            .unwrap_or_else(|| "default".to_string()))
    }

    /// The configured database only, when one is set.
    async fn schema_names(&self) -> Result<Vec<String>> {
        if let Some(database) = &self.database {
            return Ok(vec![database.clone()]);
        }
        Ok(first_column(self.client.query("SHOW DATABASES").await?))
    }

    async fn table_names(&self, schema: &str) -> Result<Vec<String>> {
        let sql = format!("SHOW TABLES IN {}", quote_identifier(schema));
        Ok(first_column(self.client.query(&sql).await?))
    }

    async fn view_names(&self, schema: &str) -> Result<Vec<String>> {
        let sql = format!("SHOW VIEWS IN {}", quote_identifier(schema));
        Ok(first_column(self.client.query(&sql).await?))
    }

    async fn columns(&self, table: &str, schema: &str) -> Result<Vec<ColumnInfo>> {
        let sql = format!("DESCRIBE {}", Self::qualified(schema, table));
        let rows = self.client.query(&sql).await?;
        Ok(describe::parse_columns(&rows))
    }

    async fn table_comment_and_properties(
        &self,
        table: &str,
        schema: &str,
    ) -> Result<TableProperties> {
        let sql = format!("DESCRIBE FORMATTED {}", Self::qualified(schema, table));
        let rows = self.client.query(&sql).await?;
        let properties = describe::parse_table_properties(&rows, &self.storage_env)?;
        tracing::trace!("Properties of {}.{}: {:?}", schema, table, properties.properties);
        Ok(properties)
    }

    async fn view_definition(&self, view: &str, schema: &str) -> Result<String> {
        let sql = format!("SHOW CREATE VIEW {}", Self::qualified(schema, view));
        let rows = self.client.query(&sql).await?;
        let lines: Vec<String> = rows
            .into_iter()
            .filter_map(|row| row.into_iter().next().flatten())
            .collect();
        Ok(lines.join("\n").trim().to_string())
    }
}
