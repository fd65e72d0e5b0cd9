//! Create `external_link` table with FK to `external_link_monitoring_tool`.
//!
//! Links are soft-deleted through `active`; rows are never removed.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExternalLink::Table)
                    .if_not_exists()
                    .col(pk_auto(ExternalLink::Id))
                    .col(integer(ExternalLink::MonitoringToolId).not_null())
                    .col(string_len(ExternalLink::Name, 256).not_null())
                    .col(text(ExternalLink::Url).not_null())
                    .col(boolean(ExternalLink::Active).not_null())
                    .col(timestamp_with_time_zone(ExternalLink::CreatedOn).not_null())
                    .col(integer_null(ExternalLink::CreatedBy))
                    .col(timestamp_with_time_zone(ExternalLink::UpdatedOn).not_null())
                    .col(integer_null(ExternalLink::UpdatedBy))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_external_link_monitoring_tool")
                            .from(ExternalLink::Table, ExternalLink::MonitoringToolId)
                            .to(MonitoringTool::Table, MonitoringTool::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ExternalLink::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ExternalLink {
    Table,
    Id,
    #[sea_orm(iden = "external_link_monitoring_tool_id")]
    MonitoringToolId,
    Name,
    Url,
    Active,
    CreatedOn,
    CreatedBy,
    UpdatedOn,
    UpdatedBy,
}

#[derive(DeriveIden)]
enum MonitoringTool {
    #[sea_orm(iden = "external_link_monitoring_tool")]
    Table,
    Id,
}
