//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_monitoring_tool;
mod m20240101_000002_create_external_link;
mod m20240101_000003_create_external_link_cluster_mapping;
mod m20240101_000004_create_self_registration_roles;
mod m20240101_000005_create_app_user;
mod m20240101_000006_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_monitoring_tool::Migration),
            Box::new(m20240101_000002_create_external_link::Migration),
            Box::new(m20240101_000003_create_external_link_cluster_mapping::Migration),
            Box::new(m20240101_000004_create_self_registration_roles::Migration),
            Box::new(m20240101_000005_create_app_user::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000006_add_indexes::Migration),
        ]
    }
}
