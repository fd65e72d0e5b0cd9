use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use models::{external_link, external_link_cluster, monitoring_tool};

use crate::audit::AuditLog;
use crate::errors::ServiceError;
use crate::linkout::domain::{ClusterLink, Link, LinkCluster, MonitoringTool};
use crate::linkout::repository::{LinkClusterRepository, LinkRepository, MonitoringToolRepository};

fn ts(t: DateTime<Utc>) -> DateTime<FixedOffset> { t.into() }

fn to_link(m: external_link::Model) -> Link {
    Link {
        id: m.id,
        name: m.name,
        url: m.url,
        active: m.active,
        monitoring_tool_id: m.monitoring_tool_id,
        audit: AuditLog {
            created_on: m.created_on.with_timezone(&Utc),
            created_by: m.created_by,
            updated_on: m.updated_on.with_timezone(&Utc),
            updated_by: m.updated_by,
        },
    }
}

fn to_cluster_links(rows: Vec<(external_link_cluster::Model, Option<external_link::Model>)>) -> Vec<ClusterLink> {
    rows.into_iter()
        .filter_map(|(m, link)| link.map(|l| ClusterLink { cluster_id: m.cluster_id, link: to_link(l) }))
        .collect()
}

pub struct SeaOrmLinkRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl LinkRepository for SeaOrmLinkRepository {
    async fn save(&self, link: Link) -> Result<Link, ServiceError> {
        let am = external_link::ActiveModel {
            monitoring_tool_id: Set(link.monitoring_tool_id),
            name: Set(link.name),
            url: Set(link.url),
            active: Set(link.active),
            created_on: Set(ts(link.audit.created_on)),
            created_by: Set(link.audit.created_by),
            updated_on: Set(ts(link.audit.updated_on)),
            updated_by: Set(link.audit.updated_by),
            ..Default::default()
        };
        let saved = am.insert(&self.db).await.map_err(ServiceError::db)?;
        Ok(to_link(saved))
    }

    async fn update(&self, link: &Link) -> Result<(), ServiceError> {
        let am = external_link::ActiveModel {
            id: Unchanged(link.id),
            monitoring_tool_id: Set(link.monitoring_tool_id),
            name: Set(link.name.clone()),
            url: Set(link.url.clone()),
            active: Set(link.active),
            updated_on: Set(ts(link.audit.updated_on)),
            updated_by: Set(link.audit.updated_by),
            ..Default::default()
        };
        match am.update(&self.db).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(ServiceError::not_found("external link")),
            Err(e) => Err(ServiceError::db(e)),
        }
    }

    async fn find_one(&self, id: i32) -> Result<Option<Link>, ServiceError> {
        let found = external_link::Entity::find_by_id(id).one(&self.db).await.map_err(ServiceError::db)?;
        Ok(found.map(to_link))
    }

    async fn find_all_non_mapped(&self, excluded: &[i32]) -> Result<Vec<Link>, ServiceError> {
        let mut q = external_link::Entity::find().filter(external_link::Column::Active.eq(true));
        // `NOT IN ()` is not valid SQL
        if !excluded.is_empty() {
            q = q.filter(external_link::Column::Id.is_not_in(excluded.iter().copied()));
        }
        let rows = q.order_by_asc(external_link::Column::Id).all(&self.db).await.map_err(ServiceError::db)?;
        Ok(rows.into_iter().map(to_link).collect())
    }

    async fn deactivate(&self, id: i32, updated_by: Option<i32>, updated_on: DateTime<Utc>) -> Result<(), ServiceError> {
        let res = external_link::Entity::update_many()
            .col_expr(external_link::Column::Active, Expr::value(false))
            .col_expr(external_link::Column::UpdatedOn, Expr::value(ts(updated_on)))
            .col_expr(external_link::Column::UpdatedBy, Expr::value(updated_by))
            .filter(external_link::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(ServiceError::db)?;
        if res.rows_affected == 0 {
            return Err(ServiceError::not_found("external link"));
        }
        Ok(())
    }
}

pub struct SeaOrmLinkClusterRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl LinkClusterRepository for SeaOrmLinkClusterRepository {
    async fn save(&self, mapping: &LinkCluster) -> Result<(), ServiceError> {
        let am = external_link_cluster::ActiveModel {
            external_link_id: Set(mapping.link_id),
            cluster_id: Set(mapping.cluster_id),
            active: Set(mapping.active),
            created_on: Set(ts(mapping.audit.created_on)),
            created_by: Set(mapping.audit.created_by),
            updated_on: Set(ts(mapping.audit.updated_on)),
            updated_by: Set(mapping.audit.updated_by),
            ..Default::default()
        };
        am.insert(&self.db).await.map_err(ServiceError::db)?;
        Ok(())
    }

    async fn update(&self, mapping: &LinkCluster) -> Result<(), ServiceError> {
        let res = external_link_cluster::Entity::update_many()
            .col_expr(external_link_cluster::Column::Active, Expr::value(mapping.active))
            .col_expr(external_link_cluster::Column::UpdatedOn, Expr::value(ts(mapping.audit.updated_on)))
            .col_expr(external_link_cluster::Column::UpdatedBy, Expr::value(mapping.audit.updated_by))
            .filter(external_link_cluster::Column::ExternalLinkId.eq(mapping.link_id))
            .filter(external_link_cluster::Column::ClusterId.eq(mapping.cluster_id))
            .exec(&self.db)
            .await
            .map_err(ServiceError::db)?;
        if res.rows_affected == 0 {
            return Err(ServiceError::not_found("external link cluster mapping"));
        }
        Ok(())
    }

    async fn find_all_active(&self) -> Result<Vec<ClusterLink>, ServiceError> {
        let rows = external_link_cluster::Entity::find()
            .filter(external_link_cluster::Column::Active.eq(true))
            .find_also_related(external_link::Entity)
            .order_by_asc(external_link_cluster::Column::Id)
            .all(&self.db)
            .await
            .map_err(ServiceError::db)?;
        Ok(to_cluster_links(rows))
    }

    async fn find_all_active_by_cluster(&self, cluster_id: i32) -> Result<Vec<ClusterLink>, ServiceError> {
        let rows = external_link_cluster::Entity::find()
            .filter(external_link_cluster::Column::Active.eq(true))
            .filter(external_link_cluster::Column::ClusterId.eq(cluster_id))
            .find_also_related(external_link::Entity)
            .order_by_asc(external_link_cluster::Column::Id)
            .all(&self.db)
            .await
            .map_err(ServiceError::db)?;
        Ok(to_cluster_links(rows))
    }

    async fn find_all_clusters(&self, link_id: i32) -> Result<Vec<i32>, ServiceError> {
        external_link_cluster::Entity::find()
            .select_only()
            .column(external_link_cluster::Column::ClusterId)
            .filter(external_link_cluster::Column::ExternalLinkId.eq(link_id))
            .order_by_asc(external_link_cluster::Column::Id)
            .into_tuple::<i32>()
            .all(&self.db)
            .await
            .map_err(ServiceError::db)
    }
}

pub struct SeaOrmMonitoringToolRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl MonitoringToolRepository for SeaOrmMonitoringToolRepository {
    async fn find_all_active(&self) -> Result<Vec<MonitoringTool>, ServiceError> {
        let rows = monitoring_tool::Entity::find()
            .filter(monitoring_tool::Column::Active.eq(true))
            .order_by_asc(monitoring_tool::Column::Id)
            .all(&self.db)
            .await
            .map_err(ServiceError::db)?;
        Ok(rows.into_iter().map(|t| MonitoringTool { id: t.id, name: t.name, icon: t.icon }).collect())
    }
}
