//! Basic SQLite profiler.
//!
//! Computes the row count, the column count and per-column null and
//! distinct counts with plain aggregate queries. A request carrying custom
//! SQL is profiled over that query instead of the whole table.

use super::{quote_identifier, quote_literal};
use crate::error::CrawlError;
use crate::models::{DatasetProfile, FieldProfile};
use crate::profiling::{ProfileRequest, Profiler};
use crate::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

/// Row counts plus per-column null and distinct counts via aggregate queries.
#[derive(Debug, Clone)]
pub struct SqliteProfiler {
    pool: SqlitePool,
}

impl SqliteProfiler {
    /// Profiler over `pool`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn column_names(&self, schema: &str, table: &str) -> Result<Vec<String>> {
        let query = format!(
            "PRAGMA {}.table_info({})",
            quote_identifier(schema),
            quote_literal(table)
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CrawlError::collection_failed(format!("Failed to get columns for {schema}.{table}"), e))?;
        rows.iter()
            .map(|row| -> Result<String> {
                row.try_get("name")
                    .map_err(|e| CrawlError::collection_failed("Failed to parse column name", e))
            })
            .collect()
    }
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[async_trait]
impl Profiler for SqliteProfiler {
    async fn profile(&self, request: &ProfileRequest) -> Result<Option<DatasetProfile>> {
        let columns = self.column_names(&request.schema, &request.table).await?;
        if columns.is_empty() {
            return Ok(None);
        }

        let source = match &request.custom_sql {
            Some(sql) => format!("({sql})"),
            None => format!(
                "{}.{}",
                quote_identifier(&request.schema),
                quote_identifier(&request.table)
            ),
        };

        let row_count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {source}"))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CrawlError::collection_failed(format!("Failed to count rows of {}", request.identity.name), e))?;

        let mut field_profiles = Vec::with_capacity(columns.len());
        for column in &columns {
            let quoted = quote_identifier(column);
            let query = format!(
                "SELECT COUNT(*) - COUNT({quoted}) AS null_count, COUNT(DISTINCT {quoted}) AS distinct_count FROM {source}"
            );
            let row = sqlx::query(&query)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| CrawlError::collection_failed(format!("Failed to profile column {column}"), e))?;
            let parse = |e: sqlx::Error| CrawlError::collection_failed("Failed to parse column profile", e);
            field_profiles.push(FieldProfile {
                field_path: column.clone(),
                null_count: Some(to_count(row.try_get("null_count").map_err(parse)?)),
                distinct_count: Some(to_count(row.try_get("distinct_count").map_err(parse)?)),
            });
        }

        tracing::debug!(
            "Profiled {}: {} rows, {} columns",
            request.identity.name,
            row_count,
            columns.len()
        );

        Ok(Some(DatasetProfile {
            timestamp_millis: chrono::Utc::now().timestamp_millis(),
            row_count: Some(to_count(row_count)),
            column_count: Some(columns.len() as u64),
            partition: request.partition.clone(),
            field_profiles,
        }))
    }
}
