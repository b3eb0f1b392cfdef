//! SQLite introspection.
//!
//! # SQLite System Tables
//! - `PRAGMA database_list`: attached databases, exposed as schemas
//! - `"{schema}".sqlite_master`: table and view definitions
//! - `PRAGMA "{schema}".table_info()`: column information and primary key
//! - `PRAGMA "{schema}".foreign_key_list()`: foreign keys

use super::{quote_identifier, quote_literal};
use crate::adapters::Inspector;
use crate::error::CrawlError;
use crate::models::{ColumnInfo, ForeignKeyRecord, PrimaryKey};
use crate::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

/// Inspector over one SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteInspector {
    pool: SqlitePool,
    database: String,
}

/// One row of `PRAGMA table_info`.
#[derive(Debug, Clone)]
struct TableInfoRow {
    name: String,
    declared_type: String,
    not_null: bool,
    /// 1-based position in the primary key, 0 when not part of it
    pk_position: i64,
}

impl SqliteInspector {
    /// Inspector over `pool`, reporting `database` as the database name.
    pub fn new(pool: SqlitePool, database: impl Into<String>) -> Self {
        Self {
            pool,
            database: database.into(),
        }
    }

    async fn object_names(&self, schema: &str, object_type: &str) -> Result<Vec<String>> {
        let query = format!(
            "SELECT name FROM {}.sqlite_master WHERE type = {} AND name NOT LIKE 'sqlite_%' ORDER BY name",
            quote_identifier(schema),
            quote_literal(object_type)
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                CrawlError::collection_failed(format!("Failed to enumerate {object_type}s in {schema}"), e)
            })?;

        rows.iter()
            .map(|row| -> Result<String> {
                row.try_get::<String, _>("name").map_err(|e| {
                    CrawlError::collection_failed(format!("Failed to parse {object_type} name"), e)
                })
            })
            .collect()
    }

    async fn table_info(&self, table: &str, schema: &str) -> Result<Vec<TableInfoRow>> {
        let query = format!(
            "PRAGMA {}.table_info({})",
            quote_identifier(schema),
            quote_literal(table)
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                CrawlError::collection_failed(format!("Failed to get columns for {schema}.{table}"), e)
            })?;

        rows.iter()
            .map(|row| -> Result<TableInfoRow> {
                let parse = |e: sqlx::Error| CrawlError::collection_failed("Failed to parse column info", e);
                Ok(TableInfoRow {
                    name: row.try_get("name").map_err(parse)?,
                    declared_type: row
                        .try_get::<Option<String>, _>("type")
                        .map_err(parse)?
                        .unwrap_or_default(),
                    not_null: row.try_get::<i64, _>("notnull").map_err(parse)? != 0,
                    pk_position: row.try_get("pk").map_err(parse)?,
                })
            })
            .collect()
    }

    fn primary_key_from(rows: &[TableInfoRow]) -> Option<PrimaryKey> {
        let mut key: Vec<&TableInfoRow> = rows.iter().filter(|r| r.pk_position > 0).collect();
        if key.is_empty() {
            return None;
        }
        key.sort_by_key(|r| r.pk_position);
        Some(PrimaryKey {
            name: None,
            columns: key.into_iter().map(|r| r.name.clone()).collect(),
        })
    }
}

#[async_trait]
impl Inspector for SqliteInspector {
    fn dialect(&self) -> &str {
        "sqlite"
    }

    async fn database_name(&self) -> Result<String> {
        Ok(self.database.clone())
    }

    async fn schema_names(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("PRAGMA database_list")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CrawlError::collection_failed("Failed to list attached databases", e))?;

        let mut schemas = Vec::new();
        for row in &rows {
            let name: String = row.try_get("name").map_err(|e| {
                CrawlError::collection_failed("Failed to parse database name", e)
            })?;
            // temp holds per-connection objects only
            if name != "temp" {
                schemas.push(name);
            }
        }
        Ok(schemas)
    }

    async fn table_names(&self, schema: &str) -> Result<Vec<String>> {
        self.object_names(schema, "table").await
    }

    async fn view_names(&self, schema: &str) -> Result<Vec<String>> {
        self.object_names(schema, "view").await
    }

    async fn columns(&self, table: &str, schema: &str) -> Result<Vec<ColumnInfo>> {
        let rows = self.table_info(table, schema).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                // Primary key columns are implicitly NOT NULL
                let nullable = !row.not_null && row.pk_position == 0;
                let column = ColumnInfo::new(row.name, row.declared_type.clone()).with_nullable(nullable);
                if row.declared_type.is_empty() {
                    column
                } else {
                    column.with_full_type(row.declared_type)
                }
            })
            .collect())
    }

    async fn primary_key(&self, table: &str, schema: &str) -> Result<Option<PrimaryKey>> {
        let rows = self.table_info(table, schema).await?;
        Ok(Self::primary_key_from(&rows))
    }

    async fn foreign_keys(&self, table: &str, schema: &str) -> Result<Vec<ForeignKeyRecord>> {
        let query = format!(
            "PRAGMA {}.foreign_key_list({})",
            quote_identifier(schema),
            quote_literal(table)
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                CrawlError::collection_failed(format!("Failed to get foreign keys for {schema}.{table}"), e)
            })?;

        // One constraint per id, columns ordered by seq
        let mut grouped: BTreeMap<i64, (String, Vec<(i64, String, Option<String>)>)> = BTreeMap::new();
        for row in &rows {
            let parse = |e: sqlx::Error| CrawlError::collection_failed("Failed to parse foreign key", e);
            let id: i64 = row.try_get("id").map_err(parse)?;
            let seq: i64 = row.try_get("seq").map_err(parse)?;
            let referred: String = row.try_get("table").map_err(parse)?;
            let from: String = row.try_get("from").map_err(parse)?;
            let to: Option<String> = row.try_get("to").map_err(parse)?;
            grouped
                .entry(id)
                .or_insert_with(|| (referred, Vec::new()))
                .1
                .push((seq, from, to));
        }

        let mut records = Vec::new();
        for (id, (referred_table, mut columns)) in grouped {
            columns.sort_by_key(|(seq, _, _)| *seq);
            let mut referred_columns: Vec<String> =
                columns.iter().filter_map(|(_, _, to)| to.clone()).collect();

            // A bare REFERENCES clause targets the referred table's primary key
            if referred_columns.len() != columns.len() {
                referred_columns = self
                    .primary_key(&referred_table, schema)
                    .await?
                    .map(|pk| pk.columns)
                    .unwrap_or_default();
            }

            records.push(ForeignKeyRecord {
                name: Some(format!("fk_{table}_{id}")),
                columns: columns.into_iter().map(|(_, from, _)| from).collect(),
                referred_schema: Some(schema.to_string()),
                referred_table,
                referred_columns,
            });
        }
        Ok(records)
    }

    async fn view_definition(&self, view: &str, schema: &str) -> Result<String> {
        let query = format!(
            "SELECT sql FROM {}.sqlite_master WHERE type = 'view' AND name = ?",
            quote_identifier(schema)
        );
        let definition: Option<Option<String>> = sqlx::query_scalar(&query)
            .bind(view)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                CrawlError::collection_failed(format!("Failed to get definition of {schema}.{view}"), e)
            })?;
        Ok(definition.flatten().unwrap_or_default())
    }

    async fn database_properties(&self, _database: &str) -> Result<BTreeMap<String, String>> {
        let version: String = sqlx::query_scalar("SELECT sqlite_version()")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CrawlError::collection_failed("Failed to get SQLite version", e))?;
        let encoding: String = sqlx::query_scalar("PRAGMA encoding")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CrawlError::collection_failed("Failed to get encoding", e))?;

        Ok(BTreeMap::from([
            ("version".to_string(), version),
            ("encoding".to_string(), encoding),
        ]))
    }
}
