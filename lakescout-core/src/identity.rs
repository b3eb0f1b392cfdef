//! Dataset naming.
//!
//! Dialects override [`IdentifierNormalizer`] to fold case or to qualify
//! names differently; the scanner calls `standardize`, then `identifier`,
//! then `normalise` on every entity before deduplication.

use crate::models::DatasetIdentity;

/// Builds and canonicalizes dataset identifiers.
///
/// Implementations must be pure; they run on every entity before
/// deduplication.
pub trait IdentifierNormalizer: Send + Sync {
    /// Adjusts raw schema and entity names before an identifier is built.
    fn standardize(&self, schema: &str, entity: &str) -> (String, String) {
        (schema.to_string(), entity.to_string())
    }

    /// Qualified identifier for an entity, `{schema}.{entity}` by default.
    fn identifier(&self, schema: &str, entity: &str) -> String {
        format!("{schema}.{entity}")
    }

    /// Platform-specific canonicalization applied after [`Self::identifier`].
    fn normalise(&self, identifier: &str) -> String {
        identifier.to_string()
    }
}

/// `{schema}.{entity}` with no further canonicalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultIdentifierNormalizer;

impl IdentifierNormalizer for DefaultIdentifierNormalizer {}

/// Lowercases schema and entity names; for case-insensitive engines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowercaseIdentifierNormalizer;

impl IdentifierNormalizer for LowercaseIdentifierNormalizer {
    fn standardize(&self, schema: &str, entity: &str) -> (String, String) {
        (schema.to_lowercase(), entity.to_lowercase())
    }
}

/// Run-wide naming context shared by every dataset identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    /// Platform name embedded in URNs
    pub platform: String,
    /// Instance prefixed to dataset names when set
    pub platform_instance: Option<String>,
    /// Environment, e.g. `PROD`
    pub env: String,
}

impl IdentityContext {
    pub fn new(platform: impl Into<String>, platform_instance: Option<String>, env: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            platform_instance,
            env: env.into(),
        }
    }

    /// Identity of the dataset `name` in `database`.`schema`.
    pub fn dataset(&self, database: &str, schema: &str, name: &str) -> DatasetIdentity {
        DatasetIdentity {
            platform: self.platform.clone(),
            platform_instance: self.platform_instance.clone(),
            env: self.env.clone(),
            database: database.to_string(),
            schema: schema.to_string(),
            name: name.to_string(),
        }
    }
}
