//! View work units. Views are not deduplicated.

use super::{RunContext, SchemaScope, snapshot_aspect};
use crate::adapters::Inspector;
use crate::models::{DatasetRecord, EntityKind, SchemaSnapshot, TableProperties};
use crate::state::StateEntityKind;
use crate::workunit::{Aspect, WorkUnit};
use crate::Result;
use std::collections::BTreeMap;

impl RunContext {
    pub(super) async fn view_entry(
        &mut self,
        inspector: &dyn Inspector,
        scope: &SchemaScope,
        view: &str,
    ) -> Vec<WorkUnit> {
        let naming = inspector.naming();
        let (schema, view) = naming.standardize(&scope.schema, view);
        let dataset_name = naming.normalise(&naming.identifier(&schema, &view));

        self.report.report_entity_scanned(&dataset_name, EntityKind::View);

        if !self.config.view_pattern().allowed(&dataset_name) {
            self.report.report_dropped(dataset_name);
            return Vec::new();
        }

        match self
            .process_view(inspector, scope, &dataset_name, &schema, &view)
            .await
        {
            Ok(units) => units,
            Err(e) => {
                tracing::warn!("Unable to ingest view {}.{} due to an exception: {}", schema, view, e);
                self.report
                    .report_warning(format!("{schema}.{view}"), format!("Ingestion error: {e}"));
                Vec::new()
            }
        }
    }

    async fn process_view(
        &mut self,
        inspector: &dyn Inspector,
        scope: &SchemaScope,
        dataset_name: &str,
        schema: &str,
        view: &str,
    ) -> Result<Vec<WorkUnit>> {
        let identity = self
            .identities
            .dataset(&scope.database, schema, dataset_name);
        let urn = identity.urn();
        self.tracker.add(StateEntityKind::View, &urn);

        let schema_snapshot = match inspector.columns(view, schema).await {
            Ok(columns) => {
                let columns = self.column_descriptors(dataset_name, columns, None, &BTreeMap::new());
                Some(SchemaSnapshot {
                    schema_name: dataset_name.to_string(),
                    platform: self.platform().to_string(),
                    columns,
                    primary_key: None,
                    foreign_keys: Vec::new(),
                })
            }
            Err(e) => {
                tracing::debug!("No columns for view {}: {}", dataset_name, e);
                self.report
                    .report_warning(dataset_name, "unable to get schema for this view");
                None
            }
        };

        let TableProperties {
            description,
            mut properties,
            ..
        } = match inspector.table_comment_and_properties(view, schema).await {
            Ok(found) => found,
            Err(e) if e.is_unsupported() => TableProperties::default(),
            Err(e) => return Err(e),
        };

        let view_definition = match inspector.view_definition(view, schema).await {
            Ok(definition) => definition,
            Err(e) if e.is_unsupported() => String::new(),
            Err(e) => return Err(e),
        };
        properties.insert("view_definition".to_string(), view_definition.clone());
        properties.insert("is_view".to_string(), "True".to_string());

        let record = DatasetRecord {
            identity,
            kind: EntityKind::View,
            description,
            properties,
            schema: schema_snapshot,
            location_urn: None,
        };

        let platform = self.platform();
        let mut units = vec![
            WorkUnit::new(platform, &urn, snapshot_aspect(&record, view)),
            self.container_membership(&urn, scope),
        ];
        units.extend(self.dataset_platform_instance(&urn));
        units.push(WorkUnit::new(
            platform,
            &urn,
            Aspect::SubTypes {
                type_names: vec![record.kind.sub_type().to_string()],
            },
        ));
        units.push(WorkUnit::new(
            platform,
            &urn,
            Aspect::ViewProperties {
                materialized: false,
                view_logic: view_definition,
                view_language: "SQL".to_string(),
            },
        ));
        units.extend(self.domain_unit(&urn, dataset_name));
        Ok(units)
    }
}
