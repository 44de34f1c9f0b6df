use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Raw audit copy of every accepted event, written before typed
/// processing. Keyed by the client event UUID so replays do not duplicate.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingestion_log")]
pub struct Model {
    /// Client event UUID from the envelope.
    #[sea_orm(primary_key, auto_increment = false)]
    pub event_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub project_id: Uuid,
    pub event_type: String,
    pub payload: Json,
    pub metadata: Option<Json>,
    pub received_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
