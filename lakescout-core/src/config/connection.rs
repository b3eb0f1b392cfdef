//! Source connection configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings shared by dialect connectors.
///
/// Passwords are never stored here; they stay inside the connection URL or
/// the transport and are redacted before logging.
///
/// # Example
/// ```rust
/// use lakescout_core::config::ConnectionConfig;
///
/// let config = ConnectionConfig::new("warehouse.internal".to_string())
///     .with_port(21050)
///     .with_database("sales".to_string());
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.to_string(), "warehouse.internal:21050/sales");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Host name or, for file sources, the database path
    pub host: String,
    /// Dialect default port when unset
    pub port: Option<u16>,
    /// Restricts the scan to this database/schema when set
    pub database: Option<String>,
    /// User name; never logged with a password
    pub username: Option<String>,
    /// Time allowed to establish the connection
    pub connect_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    /// Pool size; one per run is enough for a sequential scan
    pub max_connections: u32,
    /// Open the source read-only where the dialect supports it
    pub read_only: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            database: None,
            username: None,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_connections: 10,
            read_only: true,
        }
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.host,
            self.port.map_or_else(String::new, |p| format!(":{}", p)),
            self.database
                .as_ref()
                .map_or_else(String::new, |db| format!("/{}", db))
        )
    }
}

impl ConnectionConfig {
    /// Validates connection configuration parameters.
    ///
    /// # Errors
    /// Returns error if configuration values are invalid or unsafe
    pub fn validate(&self) -> crate::Result<()> {
        if self.host.is_empty() {
            return Err(crate::error::CrawlError::configuration(
                "host cannot be empty",
            ));
        }

        if self.port == Some(0) {
            return Err(crate::error::CrawlError::configuration(
                "port must be greater than 0",
            ));
        }

        if self.max_connections == 0 || self.max_connections > 100 {
            return Err(crate::error::CrawlError::configuration(
                "max_connections must be between 1 and 100",
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(crate::error::CrawlError::configuration(
                "connect_timeout must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Configuration for `host` with default settings.
    pub fn new(host: String) -> Self {
        Self {
            host,
            ..Default::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Restricts the scan to one database.
    pub fn with_database(mut self, database: String) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }
}
