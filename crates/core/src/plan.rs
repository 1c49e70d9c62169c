//! The plan interpreter — classifies a model reply as tool call or final answer.
//!
//! Purely a parsing function; no I/O, no side effects. A single well-defined
//! shape keeps both the "final answer" and "malformed-as-final" paths
//! converging on [`PlanDecision::FinalAnswer`], so the loop can never spin
//! on gibberish output.

use serde_json::Value;

use crate::tool::ToolCall;

/// The interpreter's verdict on one model reply.
///
/// Callers dispatch by variant; there is no "maybe a tool call" state.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanDecision {
    /// The reply is a well-formed tool request.
    ToolCall(ToolCall),
    /// Everything else: the reply is the final, user-facing answer.
    FinalAnswer,
}

/// Interpret a raw plan string.
///
/// A reply is a tool call iff it parses as a strict JSON object containing a
/// `tool` object member whose `name` is a non-blank string. `args` is taken
/// only when present and object-typed; otherwise an empty map is substituted
/// (never null). Surrounding prose or code fences make the JSON unparsable
/// and therefore degrade the reply to a final answer — the model is
/// instructed to emit bare JSON for tool calls, so this is the operator's
/// signal that prompt discipline slipped, not an error.
pub fn interpret(plan_text: &str) -> PlanDecision {
    let Ok(value) = serde_json::from_str::<Value>(plan_text) else {
        return PlanDecision::FinalAnswer;
    };

    let Some(tool) = value.get("tool").and_then(Value::as_object) else {
        return PlanDecision::FinalAnswer;
    };

    let Some(name) = tool.get("name").and_then(Value::as_str) else {
        return PlanDecision::FinalAnswer;
    };
    if name.trim().is_empty() {
        return PlanDecision::FinalAnswer;
    }

    let args = tool
        .get("args")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    PlanDecision::ToolCall(ToolCall {
        name: name.to_string(),
        args,
    })
}
