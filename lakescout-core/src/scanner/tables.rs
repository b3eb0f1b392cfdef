//! Table work units.

use super::{RunContext, SchemaScope, snapshot_aspect};
use crate::adapters::Inspector;
use crate::models::{
    CanonicalType, ColumnDescriptor, ColumnInfo, DatasetRecord, EntityKind, ForeignKeyConstraint,
    ForeignKeyRecord, PrimaryKey, SchemaSnapshot, TableProperties,
};
use crate::report::MISSING_COLUMN_INFO;
use crate::state::StateEntityKind;
use crate::type_mapping::TypeResolution;
use crate::urn::make_schema_field_urn;
use crate::workunit::{Aspect, Upstream, WorkUnit};
use crate::Result;
use std::collections::{BTreeMap, HashSet};

impl RunContext {
    /// Admits one table name from the schema listing and processes it.
    ///
    /// Duplicates (by normalized identifier) are skipped without being
    /// counted. Any processing error is reported against `{schema}.{table}`
    /// and yields nothing.
    pub(super) async fn table_entry(
        &mut self,
        inspector: &dyn Inspector,
        scope: &SchemaScope,
        table: &str,
        seen: &mut HashSet<String>,
    ) -> Vec<WorkUnit> {
        let naming = inspector.naming();
        let (schema, table) = naming.standardize(&scope.schema, table);
        let dataset_name = naming.normalise(&naming.identifier(&schema, &table));

        if !seen.insert(dataset_name.clone()) {
            tracing::debug!("{} has already been seen, skipping...", dataset_name);
            return Vec::new();
        }

        self.report.report_entity_scanned(&dataset_name, EntityKind::Table);

        if !self.config.table_pattern.allowed(&dataset_name) {
            self.report.report_dropped(dataset_name);
            return Vec::new();
        }

        match self
            .process_table(inspector, scope, &dataset_name, &schema, &table)
            .await
        {
            Ok(units) => units,
            Err(e) => {
                tracing::warn!("Unable to ingest {}.{} due to an exception: {}", schema, table, e);
                self.report
                    .report_warning(format!("{schema}.{table}"), format!("Ingestion error: {e}"));
                Vec::new()
            }
        }
    }

    async fn process_table(
        &mut self,
        inspector: &dyn Inspector,
        scope: &SchemaScope,
        dataset_name: &str,
        schema: &str,
        table: &str,
    ) -> Result<Vec<WorkUnit>> {
        let identity = self
            .identities
            .dataset(&scope.database, schema, dataset_name);
        let urn = identity.urn();
        self.tracker.add(StateEntityKind::Table, &urn);

        let columns = match inspector.columns(table, schema).await {
            Ok(columns) => columns,
            Err(e) => {
                self.report.report_warning(
                    dataset_name,
                    format!("unable to get column information due to an error -> {e}"),
                );
                return Ok(Vec::new());
            }
        };
        if columns.is_empty() {
            self.report.report_warning(dataset_name, MISSING_COLUMN_INFO);
        }

        let TableProperties {
            description,
            mut properties,
            location_urn,
        } = match inspector.table_comment_and_properties(table, schema).await {
            Ok(found) => found,
            Err(e) if e.is_unsupported() => TableProperties::default(),
            Err(e) => return Err(e),
        };

        let display_name = identity.entity_name().to_string();
        if !properties.is_empty() && display_name != table {
            properties.insert("original_table_name".to_string(), table.to_string());
        }

        let primary_key = inspector.primary_key(table, schema).await?;
        let foreign_keys = match inspector.foreign_keys(table, schema).await {
            Ok(records) => records
                .into_iter()
                .map(|record| self.foreign_key_constraint(inspector, scope, schema, &urn, record))
                .collect(),
            Err(e) => {
                tracing::debug!("Unable to get foreign keys for {}: {}", dataset_name, e);
                Vec::new()
            }
        };
        let extra_tags = inspector.extra_tags(schema, table).await?;

        let descriptors =
            self.column_descriptors(dataset_name, columns, primary_key.as_ref(), &extra_tags);
        let record = DatasetRecord {
            identity,
            kind: EntityKind::Table,
            description,
            properties,
            schema: Some(SchemaSnapshot {
                schema_name: dataset_name.to_string(),
                platform: self.platform().to_string(),
                columns: descriptors,
                primary_key,
                foreign_keys,
            }),
            location_urn,
        };

        Ok(self.table_units(&record, &display_name, scope))
    }

    fn table_units(&self, record: &DatasetRecord, display_name: &str, scope: &SchemaScope) -> Vec<WorkUnit> {
        let platform = self.platform();
        let urn = record.identity.urn();
        let mut units = vec![WorkUnit::new(platform, &urn, snapshot_aspect(record, display_name))];

        if self.config.include_table_location_lineage
            && let Some(location) = &record.location_urn
        {
            units.push(WorkUnit::new(
                platform,
                &urn,
                Aspect::UpstreamLineage {
                    upstreams: vec![Upstream {
                        dataset: location.clone(),
                        lineage_type: "COPY".to_string(),
                    }],
                },
            ));
        }

        units.push(self.container_membership(&urn, scope));
        units.extend(self.dataset_platform_instance(&urn));
        units.push(WorkUnit::new(
            platform,
            &urn,
            Aspect::SubTypes {
                type_names: vec![record.kind.sub_type().to_string()],
            },
        ));
        units.extend(self.domain_unit(&urn, &record.identity.name));
        units
    }

    /// Maps native column types, warning once per unmapped column.
    pub(super) fn column_descriptors(
        &mut self,
        dataset_name: &str,
        columns: Vec<ColumnInfo>,
        primary_key: Option<&PrimaryKey>,
        extra_tags: &BTreeMap<String, Vec<String>>,
    ) -> Vec<ColumnDescriptor> {
        columns
            .into_iter()
            .map(|column| {
                let canonical_type = match self.mapper.resolve(&column.native_type) {
                    TypeResolution::Unmapped => {
                        self.report.report_warning(
                            dataset_name,
                            format!(
                                "unable to map type {} of column {} to metadata schema",
                                column.native_type, column.name
                            ),
                        );
                        CanonicalType::Unknown
                    }
                    resolved => resolved.canonical(),
                };
                let is_part_of_key =
                    primary_key.is_some_and(|pk| pk.columns.iter().any(|c| c == &column.name));

                ColumnDescriptor {
                    tags: extra_tags.get(&column.name).cloned().unwrap_or_default(),
                    canonical_type,
                    is_part_of_key,
                    nullable: column.nullable,
                    comment: column.comment,
                    full_native_type: column.full_type,
                    native_type: column.native_type,
                    name: column.name,
                }
            })
            .collect()
    }

    fn foreign_key_constraint(
        &self,
        inspector: &dyn Inspector,
        scope: &SchemaScope,
        schema: &str,
        dataset_urn: &str,
        record: ForeignKeyRecord,
    ) -> ForeignKeyConstraint {
        let referred_schema = record.referred_schema.as_deref().unwrap_or(schema);
        let referred_name = inspector
            .naming()
            .identifier(referred_schema, &record.referred_table);
        let foreign_dataset = self
            .identities
            .dataset(&scope.database, referred_schema, &referred_name)
            .urn();

        ForeignKeyConstraint {
            name: record.name.unwrap_or_default(),
            source_fields: record
                .columns
                .iter()
                .map(|c| make_schema_field_urn(dataset_urn, c))
                .collect(),
            foreign_fields: record
                .referred_columns
                .iter()
                .map(|c| make_schema_field_urn(&foreign_dataset, c))
                .collect(),
            foreign_dataset,
        }
    }
}
