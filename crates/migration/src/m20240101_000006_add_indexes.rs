use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ClusterMapping: per-cluster listing
        manager
            .create_index(
                Index::create()
                    .name("idx_external_link_cluster_mapping_cluster")
                    .table(ClusterMapping::Table)
                    .col(ClusterMapping::ClusterId)
                    .col(ClusterMapping::Active)
                    .to_owned(),
            )
            .await?;

        // ExternalLink: active listing
        manager
            .create_index(
                Index::create()
                    .name("idx_external_link_active")
                    .table(ExternalLink::Table)
                    .col(ExternalLink::Active)
                    .to_owned(),
            )
            .await?;

        // AppUserRole: one row per (user, role)
        manager
            .create_index(
                Index::create()
                    .name("uniq_app_user_role")
                    .table(AppUserRole::Table)
                    .col(AppUserRole::UserId)
                    .col(AppUserRole::Role)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_index(Index::drop().name("uniq_app_user_role").table(AppUserRole::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_external_link_active").table(ExternalLink::Table).to_owned()).await?;
        manager
            .drop_index(Index::drop().name("idx_external_link_cluster_mapping_cluster").table(ClusterMapping::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ClusterMapping {
    #[sea_orm(iden = "external_link_cluster_mapping")]
    Table,
    ClusterId,
    Active,
}

#[derive(DeriveIden)]
enum ExternalLink { Table, Active }

#[derive(DeriveIden)]
enum AppUserRole { Table, UserId, Role }
