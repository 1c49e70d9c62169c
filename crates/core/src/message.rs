//! Playbook domain types.
//!
//! A playbook is the learned record of one successful tool-using request:
//! the user's prompt, the assistant's plans, and the tool results, in order.
//! It is persisted to the memory service on completion so the retrieval
//! layer can surface it for similar future prompts.

use serde::{Deserialize, Serialize};

/// The role of a playbook step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The end user's prompt
    User,
    /// A plan produced by the model
    Assistant,
    /// The serialized output of a tool execution
    ToolResult,
}

/// One `{role, content}` step in a playbook sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookStep {
    pub role: Role,
    pub content: String,
}

impl PlaybookStep {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn tool_result(content: impl Into<String>) -> Self {
        Self {
            role: Role::ToolResult,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::ToolResult).unwrap(),
            "\"tool_result\""
        );
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn step_round_trips() {
        let step = PlaybookStep::tool_result("{\"status\":\"ok\"}");
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains("\"role\":\"tool_result\""));
        let back: PlaybookStep = serde_json::from_str(&json).unwrap();
        assert_eq!(back, step);
    }

    #[test]
    fn constructors_set_roles() {
        assert_eq!(PlaybookStep::user("p").role, Role::User);
        assert_eq!(PlaybookStep::assistant("a").role, Role::Assistant);
        assert_eq!(PlaybookStep::tool_result("t").role, Role::ToolResult);
    }
}
