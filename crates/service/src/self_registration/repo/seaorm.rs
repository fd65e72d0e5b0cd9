use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set, TransactionTrait};

use models::{app_user, app_user_role, self_registration_role};

use crate::errors::ServiceError;
use crate::self_registration::domain::{DefaultRole, ProvisionedUser, UserInfo};
use crate::self_registration::repository::{RoleCatalogRepository, UserProvisioner};

pub struct SeaOrmRoleCatalogRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl RoleCatalogRepository for SeaOrmRoleCatalogRepository {
    async fn get_all(&self) -> Result<Vec<DefaultRole>, ServiceError> {
        let rows = self_registration_role::Entity::find()
            .order_by_asc(self_registration_role::Column::Role)
            .all(&self.db)
            .await
            .map_err(ServiceError::db)?;
        Ok(rows.into_iter().map(|r| DefaultRole { role: r.role }).collect())
    }
}

/// Creates the account and its role rows in one transaction.
pub struct SeaOrmUserProvisioner {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl UserProvisioner for SeaOrmUserProvisioner {
    async fn is_registered(&self, email_id: &str) -> Result<bool, ServiceError> {
        Ok(app_user::find_by_email(&self.db, email_id).await?.is_some())
    }

    async fn create_user(&self, info: &UserInfo) -> Result<ProvisionedUser, ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db)?;
        if app_user::find_by_email(&txn, &info.email_id).await?.is_some() {
            return Err(ServiceError::Conflict(format!("user {} already exists", info.email_id)));
        }
        let user = app_user::create(&txn, &info.email_id).await?;
        for role in &info.roles {
            app_user_role::ActiveModel {
                user_id: Set(user.id),
                role: Set(role.clone()),
                created_on: Set(Utc::now().into()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db)?;
        }
        txn.commit().await.map_err(ServiceError::db)?;
        Ok(ProvisionedUser { id: user.id, email_id: user.email_id, roles: info.roles.clone() })
    }
}
