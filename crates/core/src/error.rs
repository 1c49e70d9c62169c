//! Error types for the PAGI planner domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. The taxonomy mirrors the
//! driver's failure policy: model errors are fatal for the request, tool
//! transport errors feed back into the loop, memory/audit/notification
//! errors are absorbed by the caller (log-and-continue), and request
//! cancellation is its own class — the only error besides a failed model
//! call that ever reaches the HTTP layer.

use thiserror::Error;

/// The top-level error type for all planner operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model gateway errors (fatal for the request) ---
    #[error("Model gateway error: {0}")]
    Model(#[from] ModelError),

    // --- Tool errors (fed back into the loop) ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Memory errors (best-effort) ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Audit errors (best-effort) ---
    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    // --- Notification errors (best-effort) ---
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    // --- Request cancellation (surfaced to the caller, never absorbed) ---
    #[error("Request cancelled")]
    Cancelled,

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("GetPlan RPC failed: {message}")]
    Rpc { message: String },

    #[error("GetPlan timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("ExecuteTool({tool_name}) failed: {message}")]
    Transport { tool_name: String, message: String },
}

#[derive(Debug, Clone, Error)]
pub enum MemoryError {
    #[error("Session history fetch failed: {0}")]
    Fetch(String),

    #[error("Session store failed: {0}")]
    Store(String),

    #[error("Playbook store failed: {0}")]
    Playbook(String),

    #[error("RAG retrieval failed: {0}")]
    Retrieval(String),
}

#[derive(Debug, Clone, Error)]
pub enum AuditError {
    #[error("Audit storage error: {0}")]
    Storage(String),

    #[error("Audit payload serialization failed: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("Notification broker unavailable: {0}")]
    Unavailable(String),

    #[error("Notification publish failed: {0}")]
    Publish(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_displays_correctly() {
        let err = Error::Model(ModelError::Rpc {
            message: "connection refused".into(),
        });
        assert!(err.to_string().contains("GetPlan"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn tool_error_carries_tool_name() {
        let err = Error::Tool(ToolError::Transport {
            tool_name: "search".into(),
            message: "deadline exceeded".into(),
        });
        assert!(err.to_string().contains("search"));
        assert!(err.to_string().contains("deadline exceeded"));
    }

    #[test]
    fn timeout_error_includes_duration() {
        let err = ModelError::Timeout { timeout_secs: 5 };
        assert!(err.to_string().contains("5s"));
    }

    #[test]
    fn cancellation_is_its_own_class() {
        let err = Error::Cancelled;
        assert_eq!(err.to_string(), "Request cancelled");
        assert!(!matches!(err, Error::Model(_)));
    }
}
