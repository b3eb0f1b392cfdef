//! Core data models for extracted dataset metadata.
//!
//! Inspectors return the raw shapes ([`ColumnInfo`], [`ForeignKeyRecord`],
//! [`TableProperties`]); the scanner resolves them into the emitted shapes
//! ([`ColumnDescriptor`], [`SchemaSnapshot`], [`DatasetRecord`]). Maps are
//! `BTreeMap` throughout so serialized output is deterministic.

use crate::urn::make_dataset_urn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical column type every native type is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalType {
    /// Integers, decimals and floats
    Number,
    /// Character data
    String,
    Boolean,
    /// Calendar date without time
    Date,
    /// Timestamps, datetimes and intervals
    Time,
    /// Binary data
    Bytes,
    Array,
    /// Structs, maps and JSON documents
    Record,
    Enum,
    /// Unmapped or deliberately unmapped types
    Unknown,
}

impl std::fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CanonicalType::Number => "number",
            CanonicalType::String => "string",
            CanonicalType::Boolean => "boolean",
            CanonicalType::Date => "date",
            CanonicalType::Time => "time",
            CanonicalType::Bytes => "bytes",
            CanonicalType::Array => "array",
            CanonicalType::Record => "record",
            CanonicalType::Enum => "enum",
            CanonicalType::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// Kind of dataset entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Base table
    Table,
    /// View
    View,
}

impl EntityKind {
    /// Subtype label emitted for the entity.
    pub fn sub_type(self) -> &'static str {
        match self {
            EntityKind::Table => "table",
            EntityKind::View => "view",
        }
    }
}

/// Fully resolved identity of a table or view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetIdentity {
    pub platform: String,
    pub platform_instance: Option<String>,
    pub env: String,
    /// Database (namespace root) the dataset lives in
    pub database: String,
    /// Schema within the database
    pub schema: String,
    /// Normalized qualified name, e.g. `sales.orders`
    pub name: String,
}

impl DatasetIdentity {
    /// Canonical string key for this identity.
    pub fn urn(&self) -> String {
        make_dataset_urn(
            &self.platform,
            &self.name,
            self.platform_instance.as_deref(),
            &self.env,
        )
    }

    /// Last dotted segment of the qualified name.
    pub fn entity_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// Column as returned by an inspector, before type mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Native type as declared, e.g. `DECIMAL(10,2)` or `array<string>`
    pub native_type: String,
    /// Full native type when the declared one was abbreviated
    pub full_type: Option<String>,
    pub nullable: bool,
    pub comment: Option<String>,
}

impl ColumnInfo {
    /// Nullable column with no comment.
    pub fn new(name: impl Into<String>, native_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
            full_type: None,
            nullable: true,
            comment: None,
        }
    }

    /// Sets the unabbreviated native type.
    pub fn with_full_type(mut self, full_type: impl Into<String>) -> Self {
        self.full_type = Some(full_type.into());
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Column as emitted in a schema snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub native_type: String,
    /// Result of the run's type mapper
    pub canonical_type: CanonicalType,
    pub nullable: bool,
    pub comment: Option<String>,
    /// Unabbreviated native type, when it differs
    pub full_native_type: Option<String>,
    /// Tags supplied by the dialect
    pub tags: Vec<String>,
    /// Column belongs to the primary key
    pub is_part_of_key: bool,
}

impl ColumnDescriptor {
    /// Native type string preserved in the catalog: the full type when known.
    pub fn native_data_type(&self) -> &str {
        self.full_native_type.as_deref().unwrap_or(&self.native_type)
    }
}

/// Primary key constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub name: Option<String>,
    /// Key columns in key order
    pub columns: Vec<String>,
}

/// Foreign key as reported by an inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRecord {
    pub name: Option<String>,
    pub columns: Vec<String>,
    /// Referenced schema; `None` means the constrained table's own schema
    pub referred_schema: Option<String>,
    pub referred_table: String,
    /// Referenced columns, aligned with `columns`
    pub referred_columns: Vec<String>,
}

/// Foreign key resolved to schema-field URNs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyConstraint {
    /// Constraint name
    pub name: String,
    /// URN of the referenced dataset
    pub foreign_dataset: String,
    /// Schema-field URNs on the referenced dataset
    pub foreign_fields: Vec<String>,
    /// Schema-field URNs on the constrained dataset
    pub source_fields: Vec<String>,
}

/// Ordered columns plus key constraints for one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    /// Qualified dataset name
    pub schema_name: String,
    pub platform: String,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Option<PrimaryKey>,
    pub foreign_keys: Vec<ForeignKeyConstraint>,
}

/// Description, properties and storage location of a table or view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableProperties {
    pub description: Option<String>,
    /// Source-specific key/value properties
    pub properties: BTreeMap<String, String>,
    /// Storage location as a dataset URN, for location lineage
    pub location_urn: Option<String>,
}

/// Everything known about one dataset in one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub identity: DatasetIdentity,
    pub kind: EntityKind,
    pub description: Option<String>,
    pub properties: BTreeMap<String, String>,
    /// `None` for views whose columns could not be read
    pub schema: Option<SchemaSnapshot>,
    pub location_urn: Option<String>,
}

/// Per-column statistics from a profiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldProfile {
    /// Column the statistics belong to
    pub field_path: String,
    pub null_count: Option<u64>,
    pub distinct_count: Option<u64>,
}

/// Profile of a dataset, optionally scoped to one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetProfile {
    /// Profile time in epoch milliseconds
    pub timestamp_millis: i64,
    pub row_count: Option<u64>,
    pub column_count: Option<u64>,
    /// Partition the profile was scoped to
    pub partition: Option<String>,
    pub field_profiles: Vec<FieldProfile>,
}
