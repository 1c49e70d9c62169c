//! Tool dispatch contract — the seam between the loop and the sandbox executor.
//!
//! The planner never implements tools; it forwards structured invocations to
//! an external sandbox and feeds the structured output back to the model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::trace::TraceId;

/// A parsed tool request extracted from a model reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to execute (never empty — the interpreter guarantees it)
    pub name: String,

    /// Arguments as an opaque JSON-object mapping.
    ///
    /// The core never destructures these; they are serialized verbatim for
    /// the sandbox. Empty when the model supplied none, never null.
    #[serde(default)]
    pub args: serde_json::Map<String, serde_json::Value>,
}

/// The structured result of a sandbox tool execution.
///
/// A non-`ok` status is a legitimate output from the driver's view — it is
/// fed back to the model, not raised as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Canonical single-string form embedded in prompts, playbooks, and
    /// session deltas, so the model always sees deterministic framing.
    pub fn to_json_string(&self) -> String {
        serde_json::to_vec(self)
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default()
    }
}

/// The sandbox executor seam.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Dispatch one tool call. Transport-level failures surface as
    /// [`ToolError`]; structured non-success does not.
    async fn execute(&self, trace: &TraceId, call: &ToolCall) -> Result<ToolOutput, ToolError>;
}
