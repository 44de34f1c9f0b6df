//! Span instrumentation for queue consumers and outbound calls.

use std::future::Future;
use tracing::{info_span, Instrument};

/// Span kind attribute, mirroring the OpenTelemetry naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Consumer,
    Producer,
    Internal,
}

impl SpanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consumer => "consumer",
            Self::Producer => "producer",
            Self::Internal => "internal",
        }
    }
}

/// Options for [`instrument`].
#[derive(Debug, Clone, Copy)]
pub struct InstrumentOpts {
    /// Span name recorded as the `operation` field.
    pub name: &'static str,
    /// Root spans start a fresh trace; non-root spans attach to the current
    /// context (the job-creator context for executor jobs).
    pub root: bool,
    pub kind: SpanKind,
}

impl InstrumentOpts {
    pub fn consumer(name: &'static str) -> Self {
        Self {
            name,
            root: false,
            kind: SpanKind::Consumer,
        }
    }

    pub fn root_consumer(name: &'static str) -> Self {
        Self {
            name,
            root: true,
            kind: SpanKind::Consumer,
        }
    }
}

/// Run a future inside an instrumentation span.
pub async fn instrument<F, T>(opts: InstrumentOpts, fut: F) -> T
where
    F: Future<Output = T>,
{
    let span = if opts.root {
        info_span!(
            parent: None,
            "queue_job",
            operation = opts.name,
            span_kind = opts.kind.as_str(),
        )
    } else {
        info_span!(
            "queue_job",
            operation = opts.name,
            span_kind = opts.kind.as_str(),
        )
    };

    fut.instrument(span).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_kind_names() {
        assert_eq!(SpanKind::Consumer.as_str(), "consumer");
        assert_eq!(SpanKind::Producer.as_str(), "producer");
        assert_eq!(SpanKind::Internal.as_str(), "internal");
    }

    #[tokio::test]
    async fn instrument_passes_through_output() {
        let result = instrument(InstrumentOpts::root_consumer("test_op"), async { 41 + 1 }).await;
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn non_root_instrument_passes_through_output() {
        let result = instrument(InstrumentOpts::consumer("test_op"), async { "done" }).await;
        assert_eq!(result, "done");
    }
}
