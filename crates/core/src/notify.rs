//! Notification contract — best-effort lifecycle broadcasts.
//!
//! Subscribers on the notification channel see, per successful request:
//! `STARTED` → a result message → `COMPLETED`. A request aborted by the turn
//! budget emits neither a result nor `COMPLETED`. Publish failures are
//! logged and swallowed; they never fail the request.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NotifyError;
use crate::trace::TraceId;

/// Lifecycle states broadcast to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    Started,
    Completed,
}

/// Lifecycle-form notification payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleNotification {
    pub trace_id: String,
    pub session_id: String,
    pub status: LifecycleStatus,
    pub timestamp: String,
}

impl LifecycleNotification {
    pub fn now(trace: &TraceId, session_id: &str, status: LifecycleStatus) -> Self {
        Self {
            trace_id: trace.as_str().to_string(),
            session_id: session_id.to_string(),
            status,
            timestamp: rfc3339_nanos_now(),
        }
    }
}

/// Result-form notification payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultNotification {
    pub trace_id: String,
    pub session_id: String,
    pub result: String,
    pub timestamp: String,
}

impl ResultNotification {
    pub fn now(trace: &TraceId, session_id: &str, result: &str) -> Self {
        Self {
            trace_id: trace.as_str().to_string(),
            session_id: session_id.to_string(),
            result: result.to_string(),
            timestamp: rfc3339_nanos_now(),
        }
    }
}

/// RFC3339 with nanosecond precision, UTC.
fn rfc3339_nanos_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// The notification publisher seam.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish_lifecycle(
        &self,
        trace: &TraceId,
        session_id: &str,
        status: LifecycleStatus,
    ) -> Result<(), NotifyError>;

    async fn publish_result(
        &self,
        trace: &TraceId,
        session_id: &str,
        result: &str,
    ) -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_status_serializes_screaming() {
        assert_eq!(
            serde_json::to_string(&LifecycleStatus::Started).unwrap(),
            "\"STARTED\""
        );
        assert_eq!(
            serde_json::to_string(&LifecycleStatus::Completed).unwrap(),
            "\"COMPLETED\""
        );
    }

    #[test]
    fn lifecycle_payload_carries_all_fields() {
        let trace = TraceId::from_header("t-1").unwrap();
        let msg = LifecycleNotification::now(&trace, "s-1", LifecycleStatus::Started);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"trace_id\":\"t-1\""));
        assert!(json.contains("\"session_id\":\"s-1\""));
        assert!(json.contains("\"status\":\"STARTED\""));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn result_payload_carries_result_text() {
        let trace = TraceId::from_header("t-2").unwrap();
        let msg = ResultNotification::now(&trace, "s-2", "all done");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"result\":\"all done\""));
    }

    #[test]
    fn timestamp_is_rfc3339_utc() {
        let ts = rfc3339_nanos_now();
        let parsed = chrono::DateTime::parse_from_rfc3339(&ts).unwrap();
        assert_eq!(parsed.timezone().utc_minus_local(), 0);
        assert!(ts.ends_with('Z'));
        assert!(ts.contains('.'), "expected sub-second precision: {ts}");
    }
}
