//! SeaORM entities for the persisted telemetry tables.
//!
//! All tables are project-scoped with a composite `(id, project_id)` key so
//! replayed batches upsert instead of duplicating.

pub mod ingestion_log;
pub mod observations;
pub mod scores;
pub mod traces;
