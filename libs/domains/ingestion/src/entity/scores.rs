use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Manual or automated evaluation score bound to a trace.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scores")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub project_id: Uuid,
    pub trace_id: String,
    pub observation_id: Option<String>,
    pub name: String,
    #[sea_orm(column_type = "Double")]
    pub value: f64,
    pub comment: Option<String>,
    pub timestamp: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
