//! Work units: the atomic, idempotent emission records of a scan.
//!
//! A work unit targets one (entity, aspect) pair. Its id is derived from the
//! platform, the entity URN and the aspect name, so replaying a scan upserts
//! the same records instead of duplicating them.

use crate::models::{DatasetProfile, SchemaSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entity type a work unit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// Table or view
    Dataset,
    /// Database or schema
    Container,
}

impl EntityType {
    /// Infers the entity type from a URN prefix.
    pub fn from_urn(urn: &str) -> Self {
        if urn.starts_with("urn:li:container:") {
            EntityType::Container
        } else {
            EntityType::Dataset
        }
    }
}

/// Name, description and properties shown for a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetProperties {
    /// Display name
    pub name: String,
    pub description: Option<String>,
    pub custom_properties: BTreeMap<String, String>,
}

/// Base snapshot of a dataset: status, properties and schema together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    /// Always `false` in snapshots; retractions use [`Aspect::Status`]
    pub removed: bool,
    pub properties: DatasetProperties,
    pub schema: Option<SchemaSnapshot>,
}

/// One upstream edge in a lineage aspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upstream {
    /// Upstream dataset URN
    pub dataset: String,
    /// Lineage kind, e.g. `COPY`
    #[serde(rename = "type")]
    pub lineage_type: String,
}

/// Aspect payloads the scanner emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "aspect", content = "value", rename_all = "camelCase")]
pub enum Aspect {
    /// Base dataset record: status, properties and schema
    DatasetSnapshot(DatasetSnapshot),
    /// Soft-delete flag; `removed: true` is a retraction
    Status {
        removed: bool,
    },
    ContainerProperties {
        name: String,
        description: Option<String>,
        custom_properties: BTreeMap<String, String>,
    },
    /// Lineage edges into the dataset
    UpstreamLineage {
        upstreams: Vec<Upstream>,
    },
    /// Platform and optional instance of the entity
    DataPlatformInstance {
        platform: String,
        instance: Option<String>,
    },
    /// Subtype labels such as `Table` or `Schema`
    SubTypes {
        type_names: Vec<String>,
    },
    /// Parent container membership
    Container {
        container: String,
    },
    /// Assigned domain URNs
    Domains {
        domains: Vec<String>,
    },
    /// View definition
    ViewProperties {
        materialized: bool,
        view_logic: String,
        view_language: String,
    },
    /// Profiling result
    DatasetProfile(DatasetProfile),
}

impl Aspect {
    /// Aspect name used in work-unit ids.
    pub fn name(&self) -> &'static str {
        match self {
            Aspect::DatasetSnapshot(_) => "datasetSnapshot",
            Aspect::Status { .. } => "status",
            Aspect::ContainerProperties { .. } => "containerProperties",
            Aspect::UpstreamLineage { .. } => "upstreamLineage",
            Aspect::DataPlatformInstance { .. } => "dataPlatformInstance",
            Aspect::SubTypes { .. } => "subTypes",
            Aspect::Container { .. } => "container",
            Aspect::Domains { .. } => "domains",
            Aspect::ViewProperties { .. } => "viewProperties",
            Aspect::DatasetProfile(_) => "datasetProfile",
        }
    }
}

/// An identified upsert-or-retract instruction for one entity aspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUnit {
    /// Deterministic `{platform}-{urn}-{aspect}` id
    pub id: String,
    pub entity_urn: String,
    pub entity_type: EntityType,
    /// Aspect payload; serialized inline as `aspect` and `value`
    #[serde(flatten)]
    pub aspect: Aspect,
}

impl WorkUnit {
    /// Work unit for `aspect` of the entity, with its derived id.
    pub fn new(platform: &str, entity_urn: impl Into<String>, aspect: Aspect) -> Self {
        let entity_urn = entity_urn.into();
        Self {
            id: Self::make_id(platform, &entity_urn, aspect.name()),
            entity_type: EntityType::from_urn(&entity_urn),
            entity_urn,
            aspect,
        }
    }

    /// Soft-delete of an entity that was not seen in the current run.
    pub fn retraction(platform: &str, entity_urn: impl Into<String>) -> Self {
        Self::new(platform, entity_urn, Aspect::Status { removed: true })
    }

    /// Work-unit id for an (entity, aspect) pair.
    pub fn make_id(platform: &str, entity_urn: &str, aspect_name: &str) -> String {
        format!("{platform}-{entity_urn}-{aspect_name}")
    }

    /// Whether this unit soft-deletes its entity.
    pub fn is_retraction(&self) -> bool {
        matches!(self.aspect, Aspect::Status { removed: true })
    }
}
