use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{errors, monitoring_tool};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "external_link")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "external_link_monitoring_tool_id")]
    pub monitoring_tool_id: i32,
    pub name: String,
    pub url: String,
    pub active: bool,
    pub created_on: DateTimeWithTimeZone,
    pub created_by: Option<i32>,
    pub updated_on: DateTimeWithTimeZone,
    pub updated_by: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { MonitoringTool }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::MonitoringTool => Entity::belongs_to(monitoring_tool::Entity)
                .from(Column::MonitoringToolId)
                .to(monitoring_tool::Column::Id)
                .into(),
        }
    }
}

impl Related<monitoring_tool::Entity> for Entity {
    fn to() -> RelationDef { Relation::MonitoringTool.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() {
        return Err(errors::ModelError::Validation("link name required".into()));
    }
    Ok(())
}

pub fn validate_url(url: &str) -> Result<(), errors::ModelError> {
    if url.trim().is_empty() {
        return Err(errors::ModelError::Validation("link url required".into()));
    }
    Ok(())
}
