//! Create `external_link_cluster_mapping` table.
//! One row per (link, cluster) pair; deactivated rather than deleted.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClusterMapping::Table)
                    .if_not_exists()
                    .col(pk_auto(ClusterMapping::Id))
                    .col(integer(ClusterMapping::ExternalLinkId).not_null())
                    .col(integer(ClusterMapping::ClusterId).not_null())
                    .col(boolean(ClusterMapping::Active).not_null())
                    .col(timestamp_with_time_zone(ClusterMapping::CreatedOn).not_null())
                    .col(integer_null(ClusterMapping::CreatedBy))
                    .col(timestamp_with_time_zone(ClusterMapping::UpdatedOn).not_null())
                    .col(integer_null(ClusterMapping::UpdatedBy))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_external_link_cluster_mapping_link")
                            .from(ClusterMapping::Table, ClusterMapping::ExternalLinkId)
                            .to(ExternalLink::Table, ExternalLink::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // updates address rows by pair, so the pair must stay unique
        manager
            .create_index(
                Index::create()
                    .name("uniq_external_link_cluster_pair")
                    .table(ClusterMapping::Table)
                    .col(ClusterMapping::ExternalLinkId)
                    .col(ClusterMapping::ClusterId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ClusterMapping::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ClusterMapping {
    #[sea_orm(iden = "external_link_cluster_mapping")]
    Table,
    Id,
    ExternalLinkId,
    ClusterId,
    Active,
    CreatedOn,
    CreatedBy,
    UpdatedOn,
    UpdatedBy,
}

#[derive(DeriveIden)]
enum ExternalLink { Table, Id }
