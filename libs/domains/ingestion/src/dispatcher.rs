//! Cross-service fan-out of trace upserts to the worker service.

use core_config::pipeline::WorkerEndpoint;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// One trace-upsert notification, as posted to the worker's `/api/events`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TraceUpsertNotification {
    pub trace_id: String,
    pub project_id: Uuid,
}

/// Posts trace-upsert notifications to the worker service.
///
/// Strictly best effort: ingestion responses never depend on the worker
/// being reachable. Failures are logged and counted, nothing more.
#[derive(Clone)]
pub struct WorkerDispatcher {
    client: reqwest::Client,
    endpoint: WorkerEndpoint,
}

impl WorkerDispatcher {
    pub fn new(endpoint: WorkerEndpoint) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();

        Self { client, endpoint }
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_configured()
    }

    /// Notify the worker about successfully created traces.
    pub async fn dispatch_trace_upserts(&self, project_id: Uuid, trace_ids: Vec<String>) {
        if trace_ids.is_empty() {
            return;
        }

        let (Some(host), Some(password)) = (&self.endpoint.host, &self.endpoint.password) else {
            debug!("Worker endpoint not configured, skipping trace-upsert dispatch");
            return;
        };

        let body: Vec<TraceUpsertNotification> = trace_ids
            .into_iter()
            .map(|trace_id| TraceUpsertNotification {
                trace_id,
                project_id,
            })
            .collect();

        let url = format!("{}/api/events", host.trim_end_matches('/'));

        let result = self
            .client
            .post(&url)
            .basic_auth("server", Some(password))
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(_) => debug!(count = body.len(), "Dispatched trace upserts to worker"),
            Err(e) => {
                warn!(error = %e, url = %url, "Failed to dispatch trace upserts");
                observability::record_increment("worker_dispatch_failures_total", 1, &[]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_endpoint_is_a_noop() {
        let dispatcher = WorkerDispatcher::new(WorkerEndpoint::default());
        assert!(!dispatcher.is_enabled());

        // No panic, no outbound call.
        dispatcher
            .dispatch_trace_upserts(Uuid::new_v4(), vec!["trace-1".to_string()])
            .await;
    }

    #[tokio::test]
    async fn partially_configured_endpoint_is_a_noop() {
        let dispatcher = WorkerDispatcher::new(WorkerEndpoint {
            host: Some("http://worker:3030".to_string()),
            password: None,
        });
        assert!(!dispatcher.is_enabled());

        dispatcher
            .dispatch_trace_upserts(Uuid::new_v4(), vec!["trace-1".to_string()])
            .await;
    }

    #[test]
    fn notification_wire_shape_is_camel_case() {
        let project_id = Uuid::new_v4();
        let notification = TraceUpsertNotification {
            trace_id: "trace-1".to_string(),
            project_id,
        };

        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["traceId"], "trace-1");
        assert_eq!(json["projectId"], project_id.to_string());
    }
}
