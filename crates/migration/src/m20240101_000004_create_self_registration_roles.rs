//! Create `self_registration_roles` table: default roles handed to self-registered users.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SelfRegistrationRoles::Table)
                    .if_not_exists()
                    .col(string_len(SelfRegistrationRoles::Role, 256).primary_key())
                    .col(timestamp_with_time_zone(SelfRegistrationRoles::CreatedOn).not_null())
                    .col(integer_null(SelfRegistrationRoles::CreatedBy))
                    .col(timestamp_with_time_zone(SelfRegistrationRoles::UpdatedOn).not_null())
                    .col(integer_null(SelfRegistrationRoles::UpdatedBy))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(SelfRegistrationRoles::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum SelfRegistrationRoles {
    Table,
    Role,
    CreatedOn,
    CreatedBy,
    UpdatedOn,
    UpdatedBy,
}
