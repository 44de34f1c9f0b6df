//! Eval Job Creator Worker - Entry Point
//!
//! Receives trace-upsert notifications from the ingestion API and turns
//! them into evaluation jobs via the TraceUpsert stream.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    pipeline_creator_worker::run().await
}
