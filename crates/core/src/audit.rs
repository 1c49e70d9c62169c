//! Audit contract — the append-only decision record.
//!
//! Every meaningful step of a request is recorded as one typed event keyed
//! by `(trace_id, session_id)`. The audit log is the canonical ordering of a
//! request's steps; for a given request the stream begins with exactly one
//! `PLAN_START` and, unless the turn budget ran out or the process crashed,
//! ends with exactly one of `PLAN_END` or `PLAN_ERROR`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AuditError;
use crate::trace::TraceId;

/// The audit event vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    PlanStart,
    PlanModelResponse,
    ToolCall,
    ToolResult,
    ToolError,
    PlanEnd,
    PlanError,
}

impl AuditEventType {
    /// The wire/storage spelling of this event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlanStart => "PLAN_START",
            Self::PlanModelResponse => "PLAN_MODEL_RESPONSE",
            Self::ToolCall => "TOOL_CALL",
            Self::ToolResult => "TOOL_RESULT",
            Self::ToolError => "TOOL_ERROR",
            Self::PlanEnd => "PLAN_END",
            Self::PlanError => "PLAN_ERROR",
        }
    }
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The audit sink seam.
///
/// Each call produces exactly one row or returns an error; callers treat
/// failures as best-effort (log and continue, never fail the request).
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    async fn record(
        &self,
        trace: &TraceId,
        session_id: &str,
        event: AuditEventType,
        payload: serde_json::Value,
    ) -> Result<(), AuditError>;
}
