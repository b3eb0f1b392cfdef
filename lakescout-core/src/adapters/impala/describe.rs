//! Parsers for `DESCRIBE` and `DESCRIBE FORMATTED` result sets.
//!
//! Both statements return three-cell rows. `DESCRIBE` lists
//! `(col_name, data_type, comment)` and, for partitioned tables, repeats the
//! partition columns after a `# Partition Information` header. `DESCRIBE
//! FORMATTED` appends a `# Detailed Table Information` section of
//! `(label, value, extra)` rows where a label with no value opens a
//! heading for the indented rows that follow:
//!
//! ```text
//! # Detailed Table Information  NULL                 NULL
//! Location:                     hdfs://nn/warehouse  NULL
//! Table Parameters:             NULL                 NULL
//!                               comment              orders fact table
//! ```

use crate::error::CrawlError;
use crate::models::{ColumnInfo, TableProperties};
use crate::urn::make_dataset_urn;
use crate::Result;
use std::collections::BTreeMap;

/// One result row; missing cells are `None`.
pub type Row = Vec<Option<String>>;

const COLUMN_HEADER: &str = "# col_name";
const PARTITION_HEADERS: &[&str] = &["# Partition Information", "# Partitioning"];
const DETAILED_INFO_HEADER: &str = "# Detailed Table Information";
const COMMENT_PROPERTY: &str = "Table Parameters: comment";
const LOCATION_PROPERTY: &str = "Location:";

fn cell(row: &Row, index: usize) -> Option<&str> {
    row.get(index).and_then(|c| c.as_deref())
}

/// Leading word of a Hive type: `decimal(10,1)` -> `decimal`,
/// `map<int,int>` -> `map`.
fn type_token(data_type: &str) -> &str {
    let end = data_type
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(data_type.len());
    &data_type[..end]
}

/// Parses `DESCRIBE` output into columns, stopping at the partition section.
pub fn parse_columns(rows: &[Row]) -> Vec<ColumnInfo> {
    let mut columns = Vec::new();
    for row in rows {
        let name = cell(row, 0).map(str::trim).unwrap_or_default();
        if name.is_empty() || name == COLUMN_HEADER {
            continue;
        }
        if PARTITION_HEADERS.contains(&name) {
            break;
        }

        let full_type = cell(row, 1).map(str::trim).unwrap_or_default();
        let mut column = ColumnInfo::new(name, type_token(full_type)).with_full_type(full_type);
        if let Some(comment) = cell(row, 2).map(str::trim)
            && !comment.is_empty()
        {
            column = column.with_comment(comment);
        }
        columns.push(column);
    }
    columns
}

/// Parses the detailed section of `DESCRIBE FORMATTED` into properties.
///
/// # Errors
/// Returns a query error when the detailed section is missing.
pub fn parse_formatted_properties(rows: &[Row]) -> Result<BTreeMap<String, String>> {
    let start = rows
        .iter()
        .position(|row| cell(row, 0).map(str::trim) == Some(DETAILED_INFO_HEADER))
        .ok_or_else(|| {
            CrawlError::query_failed(format!(
                "DESCRIBE FORMATTED output has no '{DETAILED_INFO_HEADER}' section"
            ))
        })?;

    let mut properties = BTreeMap::new();
    let mut heading: Option<String> = None;
    for row in &rows[start..] {
        let label = cell(row, 0).unwrap_or_default().trim_end();
        let data = cell(row, 1);

        match (label, data) {
            (label, _) if label.starts_with("# ") => {}
            ("", None) => heading = None,
            (label, None) => heading = Some(label.to_string()),
            ("", Some(data)) => {
                let key = format!(
                    "{} {}",
                    heading.as_deref().unwrap_or_default(),
                    data.trim_end()
                );
                let value = cell(row, 2).unwrap_or_default().trim_end();
                properties.insert(key.trim_start().to_string(), value.to_string());
            }
            (label, Some(data)) => {
                properties.insert(label.to_string(), data.trim().to_string());
            }
        }
    }
    Ok(properties)
}

/// Dataset URN of a table's storage location, for known filesystems.
pub fn storage_location_urn(location: &str, env: &str) -> Option<String> {
    let url = url::Url::parse(location).ok()?;
    let platform = match url.scheme() {
        "s3" | "s3a" | "s3n" => "s3",
        "hdfs" => "hdfs",
        "abfs" | "abfss" => "adls",
        "gs" => "gcs",
        _ => return None,
    };
    let host = url.host_str().unwrap_or_default();
    let name = format!("{}{}", host, url.path());
    let name = name.trim_end_matches('/');
    if name.is_empty() {
        return None;
    }
    Some(make_dataset_urn(platform, name, None, env))
}

/// Description, properties and location from `DESCRIBE FORMATTED` output.
pub fn parse_table_properties(rows: &[Row], env: &str) -> Result<TableProperties> {
    let properties = parse_formatted_properties(rows)?;
    Ok(TableProperties {
        description: properties.get(COMMENT_PROPERTY).cloned(),
        location_urn: properties
            .get(LOCATION_PROPERTY)
            .and_then(|location| storage_location_urn(location, env)),
        properties,
    })
}
