//! Database and schema container work units.

use super::{RunContext, SchemaScope};
use crate::adapters::Inspector;
use crate::state::StateEntityKind;
use crate::urn::{ContainerKey, make_data_platform_instance_urn, make_data_platform_urn};
use crate::workunit::{Aspect, WorkUnit};
use std::collections::BTreeMap;

impl RunContext {
    pub(super) async fn database_container(
        &mut self,
        inspector: &dyn Inspector,
        key: &ContainerKey,
    ) -> Vec<WorkUnit> {
        let database = key.display_name();
        let extra = match inspector.database_properties(database).await {
            Ok(properties) => properties,
            Err(e) => {
                tracing::debug!("No properties for database {}: {}", database, e);
                BTreeMap::new()
            }
        };

        let urn = key.urn();
        self.tracker.add(StateEntityKind::Container, &urn);

        let mut units = self.container_units(key, extra);
        units.extend(self.domain_unit(&urn, database));
        units
    }

    /// Emits the schema container, parented to `db_key`, and returns the
    /// scope that tables and views of the schema attach to.
    pub(super) async fn schema_container(
        &mut self,
        inspector: &dyn Inspector,
        db_key: &ContainerKey,
        schema: &str,
    ) -> (SchemaScope, Vec<WorkUnit>) {
        let database = db_key.display_name().to_string();
        let key = db_key.schema(schema);
        let extra = match inspector.schema_properties(&database, schema).await {
            Ok(properties) => properties,
            Err(e) => {
                tracing::debug!("No properties for schema {}.{}: {}", database, schema, e);
                BTreeMap::new()
            }
        };

        let urn = key.urn();
        self.tracker.add(StateEntityKind::Container, &urn);

        let mut units = self.container_units(&key, extra);
        units.push(WorkUnit::new(
            self.platform(),
            &urn,
            Aspect::Container {
                container: db_key.urn(),
            },
        ));

        let scope = SchemaScope {
            database,
            schema: schema.to_string(),
            container_urn: urn,
        };
        (scope, units)
    }

    /// Properties, status, platform instance and subtype units shared by
    /// both container levels.
    fn container_units(&self, key: &ContainerKey, extra: BTreeMap<String, String>) -> Vec<WorkUnit> {
        let platform = self.platform();
        let urn = key.urn();
        let mut custom_properties = key.custom_properties();
        custom_properties.extend(extra);

        vec![
            WorkUnit::new(
                platform,
                &urn,
                Aspect::ContainerProperties {
                    name: key.display_name().to_string(),
                    description: None,
                    custom_properties,
                },
            ),
            WorkUnit::new(platform, &urn, Aspect::Status { removed: false }),
            WorkUnit::new(
                platform,
                &urn,
                Aspect::DataPlatformInstance {
                    platform: make_data_platform_urn(platform),
                    instance: self
                        .identities
                        .platform_instance
                        .as_deref()
                        .map(|instance| make_data_platform_instance_urn(platform, instance)),
                },
            ),
            WorkUnit::new(
                platform,
                &urn,
                Aspect::SubTypes {
                    type_names: vec![key.sub_type().to_string()],
                },
            ),
        ]
    }
}
