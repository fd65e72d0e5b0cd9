use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{app_user_role, errors};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "app_user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub email_id: String,
    pub active: bool,
    pub created_on: DateTimeWithTimeZone,
    pub created_by: Option<i32>,
    pub updated_on: DateTimeWithTimeZone,
    pub updated_by: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Roles }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Roles => Entity::has_many(app_user_role::Entity).into() }
    }
}

impl Related<app_user_role::Entity> for Entity {
    fn to() -> RelationDef { Relation::Roles.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_email(email: &str) -> Result<(), errors::ModelError> {
    if !email.contains('@') || email.trim() != email {
        return Err(errors::ModelError::Validation("invalid email".into()));
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(db: &C, email_id: &str) -> Result<Model, errors::ModelError> {
    validate_email(email_id)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        email_id: Set(email_id.to_string()),
        active: Set(true),
        created_on: Set(now),
        created_by: Set(None),
        updated_on: Set(now),
        updated_by: Set(None),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email_id: &str) -> Result<Option<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::EmailId.eq(email_id))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}
