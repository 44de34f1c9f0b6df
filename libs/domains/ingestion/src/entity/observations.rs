use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Span, generation, or event within a trace.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "observations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub project_id: Uuid,
    pub trace_id: Option<String>,
    /// "SPAN", "GENERATION", or "EVENT".
    pub kind: String,
    pub name: Option<String>,
    pub start_time: Option<DateTimeWithTimeZone>,
    pub end_time: Option<DateTimeWithTimeZone>,
    pub parent_observation_id: Option<String>,
    /// "DEBUG", "DEFAULT", "WARNING", or "ERROR".
    pub level: String,
    pub status_message: Option<String>,
    pub model: Option<String>,
    pub input: Option<Json>,
    pub output: Option<Json>,
    pub metadata: Option<Json>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
