//! Catalog URN construction and container keys.
//!
//! Every identifier the scanner emits is a URN string. Dataset URNs embed the
//! platform, optional platform instance, qualified name and environment;
//! container URNs embed a GUID derived from a stable hash of the container
//! key so that re-running a scan yields byte-identical identifiers.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

const PLATFORM_PREFIX: &str = "urn:li:dataPlatform:";
const DOMAIN_PREFIX: &str = "urn:li:domain:";

/// Builds `urn:li:dataPlatform:{platform}`; platform URNs pass through.
pub fn make_data_platform_urn(platform: &str) -> String {
    if platform.starts_with(PLATFORM_PREFIX) {
        platform.to_string()
    } else {
        format!("{PLATFORM_PREFIX}{platform}")
    }
}

/// Builds a dataset URN, prefixing the name with the platform instance when one is set.
pub fn make_dataset_urn(
    platform: &str,
    name: &str,
    platform_instance: Option<&str>,
    env: &str,
) -> String {
    let qualified = match platform_instance {
        Some(instance) => format!("{instance}.{name}"),
        None => name.to_string(),
    };
    format!(
        "urn:li:dataset:({},{},{})",
        make_data_platform_urn(platform),
        qualified,
        env
    )
}

/// Builds a schema field URN for a column of `dataset_urn`.
pub fn make_schema_field_urn(dataset_urn: &str, field_path: &str) -> String {
    format!("urn:li:schemaField:({dataset_urn},{field_path})")
}

/// Domain labels become `urn:li:domain:{label}` unless already a domain URN.
pub fn make_domain_urn(label: &str) -> String {
    if label.starts_with(DOMAIN_PREFIX) {
        label.to_string()
    } else {
        format!("{DOMAIN_PREFIX}{label}")
    }
}

/// Builds `urn:li:dataPlatformInstance:({platform urn},{instance})`.
pub fn make_data_platform_instance_urn(platform: &str, instance: &str) -> String {
    format!(
        "urn:li:dataPlatformInstance:({},{})",
        make_data_platform_urn(platform),
        instance
    )
}

/// Key identifying a database or schema container.
///
/// When no platform instance is configured the environment stands in for the
/// instance component of the GUID, so two environments never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerKey {
    /// Database container
    Database {
        platform: String,
        instance: Option<String>,
        env: String,
        database: String,
    },
    /// Schema container nested in a database
    Schema {
        platform: String,
        instance: Option<String>,
        env: String,
        database: String,
        schema: String,
    },
}

impl ContainerKey {
    /// Database container key.
    pub fn database(
        platform: impl Into<String>,
        instance: Option<String>,
        env: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self::Database {
            platform: platform.into(),
            instance,
            env: env.into(),
            database: database.into(),
        }
    }

    /// Schema container key nested under this key's database.
    pub fn schema(&self, schema: impl Into<String>) -> Self {
        let (Self::Database {
            platform,
            instance,
            env,
            database,
        }
        | Self::Schema {
            platform,
            instance,
            env,
            database,
            ..
        }) = self;
        Self::Schema {
            platform: platform.clone(),
            instance: instance.clone(),
            env: env.clone(),
            database: database.clone(),
            schema: schema.into(),
        }
    }

    /// Human-readable container name: the database or schema name.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Database { database, .. } => database,
            Self::Schema { schema, .. } => schema,
        }
    }

    /// Subtype label attached to the container.
    pub fn sub_type(&self) -> &'static str {
        match self {
            Self::Database { .. } => "Database",
            Self::Schema { .. } => "Schema",
        }
    }

    fn guid_fields(&self) -> BTreeMap<&'static str, &str> {
        let mut fields = BTreeMap::new();
        let (platform, instance, env, database) = match self {
            Self::Database {
                platform,
                instance,
                env,
                database,
            }
            | Self::Schema {
                platform,
                instance,
                env,
                database,
                ..
            } => (platform, instance, env, database),
        };
        fields.insert("platform", platform.as_str());
        fields.insert("instance", instance.as_deref().unwrap_or(env.as_str()));
        fields.insert("database", database.as_str());
        if let Self::Schema { schema, .. } = self {
            fields.insert("schema", schema.as_str());
        }
        fields
    }

    /// Stable 32 hex character GUID over the sorted key fields.
    pub fn guid(&self) -> String {
        // BTreeMap serialization is key-ordered, so the JSON is canonical.
        let canonical = serde_json::to_string(&self.guid_fields()).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest.chars().take(32).collect()
    }

    /// Container URN, `urn:li:container:{guid}`.
    pub fn urn(&self) -> String {
        format!("urn:li:container:{}", self.guid())
    }

    /// Key/value properties recorded on the container itself.
    pub fn custom_properties(&self) -> BTreeMap<String, String> {
        self.guid_fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
