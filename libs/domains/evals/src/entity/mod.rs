//! SeaORM entities for evaluation state.

pub mod job_configurations;
pub mod job_executions;
