use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Evaluation rule configured for a project. Each enabled rule yields one
/// job execution per (sampled) trace upsert.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "job_configurations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    /// Name of the evaluator this rule invokes.
    pub evaluator: String,
    pub enabled: bool,
    /// Fraction of matching traces to evaluate, 0.0..=1.0.
    #[sea_orm(column_type = "Double")]
    pub sampling: f64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
