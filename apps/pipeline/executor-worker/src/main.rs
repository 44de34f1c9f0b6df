//! Eval Executor Worker - Entry Point
//!
//! Runs evaluation jobs from the EvaluationExecution stream and records
//! their terminal status.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    pipeline_executor_worker::run().await
}
