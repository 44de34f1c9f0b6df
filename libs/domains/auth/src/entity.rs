//! SeaORM entity for the `api_keys` table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "api_keys")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub public_key: String,
    /// Hex-encoded SHA-256 of the secret key.
    pub hashed_secret: String,
    pub project_id: Uuid,
    pub org_id: Uuid,
    /// Stored as its wire string (e.g. "cloud:pro"); parsed on load.
    pub plan: String,
    /// "all" or "scores".
    pub access_level: String,
    /// Optional per-key rate limit overrides, JSON array.
    pub rate_limit_overrides: Option<Json>,
    pub created_at: DateTimeWithTimeZone,
    pub last_used_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
