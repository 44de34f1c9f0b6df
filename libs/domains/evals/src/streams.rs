//! Stream definitions for the evaluation queues.

use stream_worker::StreamDef;

/// Trace-upsert notifications consumed by the eval job creator.
pub struct TraceUpsertStream;

impl StreamDef for TraceUpsertStream {
    const STREAM_NAME: &'static str = "TraceUpsert";
    const CONSUMER_GROUP: &'static str = "eval-job-creators";
    const DLQ_STREAM: &'static str = "TraceUpsert:dlq";
    const METRIC_PREFIX: &'static str = "trace_upsert";
    const MAX_LENGTH: i64 = 100_000;
}

/// Evaluation jobs consumed by the executor.
pub struct EvalExecutionStream;

impl StreamDef for EvalExecutionStream {
    const STREAM_NAME: &'static str = "EvaluationExecution";
    const CONSUMER_GROUP: &'static str = "eval-executors";
    const DLQ_STREAM: &'static str = "EvaluationExecution:dlq";
    const METRIC_PREFIX: &'static str = "eval_execution";
    const MAX_LENGTH: i64 = 100_000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_names_match_the_wire_contract() {
        assert_eq!(TraceUpsertStream::STREAM_NAME, "TraceUpsert");
        assert_eq!(EvalExecutionStream::STREAM_NAME, "EvaluationExecution");
    }

    #[test]
    fn metric_prefixes_are_distinct() {
        assert_eq!(TraceUpsertStream::METRIC_PREFIX, "trace_upsert");
        assert_eq!(EvalExecutionStream::METRIC_PREFIX, "eval_execution");
    }
}
