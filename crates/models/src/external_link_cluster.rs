use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::external_link;

/// Link-to-cluster association; one row per (external_link_id, cluster_id).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "external_link_cluster_mapping")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub external_link_id: i32,
    pub cluster_id: i32,
    pub active: bool,
    pub created_on: DateTimeWithTimeZone,
    pub created_by: Option<i32>,
    pub updated_on: DateTimeWithTimeZone,
    pub updated_by: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { ExternalLink }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::ExternalLink => Entity::belongs_to(external_link::Entity)
                .from(Column::ExternalLinkId)
                .to(external_link::Column::Id)
                .into(),
        }
    }
}

impl Related<external_link::Entity> for Entity {
    fn to() -> RelationDef { Relation::ExternalLink.def() }
}

impl ActiveModelBehavior for ActiveModel {}
