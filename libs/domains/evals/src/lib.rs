//! Asynchronous evaluation pipeline.
//!
//! Trace upserts flow in from the ingestion API, the job creator turns them
//! into concrete evaluation jobs per configured rule, and the executor runs
//! each job and records its terminal state:
//!
//! ```text
//! /api/events ──► TraceUpsert stream ──► EvalJobCreatorProcessor
//!                                          │ (one PENDING job execution per rule)
//!                                          ▼
//!                 EvaluationExecution stream ──► EvalExecutorProcessor
//!                                                  │ ok: COMPLETED
//!                                                  └ err: ERROR + re-throw
//! ```

pub mod creator;
pub mod entity;
pub mod error;
pub mod evaluator;
pub mod postgres;
pub mod processor;
pub mod repository;
pub mod stream_models;
pub mod streams;

pub use creator::{EvalJobCreator, RuleBasedJobCreator};
pub use entity::job_executions::JobExecutionStatus;
pub use error::{EvalError, EvalResult};
pub use evaluator::{Evaluator, NoopEvaluator};
pub use postgres::PgEvalRepository;
pub use processor::{EvalExecutorProcessor, EvalJobCreatorProcessor};
pub use repository::{
    JobConfiguration, JobConfigurationRepository, JobExecution, JobExecutionRepository,
    NewJobExecution,
};
pub use stream_models::{EvalExecutionJob, TraceUpsertJob};
pub use streams::{EvalExecutionStream, TraceUpsertStream};
