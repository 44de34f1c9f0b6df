use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Top-level trace.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "traces")]
pub struct Model {
    /// Client-supplied (or server-generated) trace ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub project_id: Uuid,
    pub timestamp: DateTimeWithTimeZone,
    pub name: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub release: Option<String>,
    pub version: Option<String>,
    pub input: Option<Json>,
    pub output: Option<Json>,
    pub metadata: Option<Json>,
    pub tags: Option<Json>,
    pub public: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
