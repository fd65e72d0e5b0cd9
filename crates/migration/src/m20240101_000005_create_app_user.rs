//! Create `app_user` and `app_user_role` tables.
//!
//! Minimal account storage backing self-registration provisioning.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AppUser::Table)
                    .if_not_exists()
                    .col(pk_auto(AppUser::Id))
                    .col(string_len(AppUser::EmailId, 255).unique_key().not_null())
                    .col(boolean(AppUser::Active).not_null())
                    .col(timestamp_with_time_zone(AppUser::CreatedOn).not_null())
                    .col(integer_null(AppUser::CreatedBy))
                    .col(timestamp_with_time_zone(AppUser::UpdatedOn).not_null())
                    .col(integer_null(AppUser::UpdatedBy))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AppUserRole::Table)
                    .if_not_exists()
                    .col(pk_auto(AppUserRole::Id))
                    .col(integer(AppUserRole::UserId).not_null())
                    .col(string_len(AppUserRole::Role, 256).not_null())
                    .col(timestamp_with_time_zone(AppUserRole::CreatedOn).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_app_user_role_user")
                            .from(AppUserRole::Table, AppUserRole::UserId)
                            .to(AppUser::Table, AppUser::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AppUserRole::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(AppUser::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AppUser {
    Table,
    Id,
    EmailId,
    Active,
    CreatedOn,
    CreatedBy,
    UpdatedOn,
    UpdatedBy,
}

#[derive(DeriveIden)]
enum AppUserRole {
    Table,
    Id,
    UserId,
    Role,
    CreatedOn,
}
