//! Create `external_link_monitoring_tool` table.
//! Read-only catalogue of monitoring tools a link can point at; seeded with the stock tools.
use sea_orm_migration::{prelude::*, schema::*};
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

const STOCK_TOOLS: [(&str, &str); 8] = [
    ("Grafana", "grafana"),
    ("Kibana", "kibana"),
    ("Newrelic", "newrelic"),
    ("Coralogix", "coralogix"),
    ("Datadog", "datadog"),
    ("Loki", "loki"),
    ("Cloudwatch", "cloudwatch"),
    ("Other", "other"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MonitoringTool::Table)
                    .if_not_exists()
                    .col(pk_auto(MonitoringTool::Id))
                    .col(string_len(MonitoringTool::Name, 128).not_null())
                    .col(string_len(MonitoringTool::Icon, 256).not_null())
                    .col(boolean(MonitoringTool::Active).not_null())
                    .col(timestamp_with_time_zone(MonitoringTool::CreatedOn).not_null())
                    .col(integer_null(MonitoringTool::CreatedBy))
                    .col(timestamp_with_time_zone(MonitoringTool::UpdatedOn).not_null())
                    .col(integer_null(MonitoringTool::UpdatedBy))
                    .to_owned(),
            )
            .await?;

        let mut insert = Query::insert()
            .into_table(MonitoringTool::Table)
            .columns([
                MonitoringTool::Name,
                MonitoringTool::Icon,
                MonitoringTool::Active,
                MonitoringTool::CreatedOn,
                MonitoringTool::UpdatedOn,
            ])
            .to_owned();
        for (name, icon) in STOCK_TOOLS {
            insert.values_panic([
                name.into(),
                icon.into(),
                true.into(),
                Expr::current_timestamp().into(),
                Expr::current_timestamp().into(),
            ]);
        }
        let db = manager.get_connection();
        db.execute(db.get_database_backend().build(&insert)).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MonitoringTool::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum MonitoringTool {
    #[sea_orm(iden = "external_link_monitoring_tool")]
    Table,
    Id,
    Name,
    Icon,
    Active,
    CreatedOn,
    CreatedBy,
    UpdatedOn,
    UpdatedBy,
}
