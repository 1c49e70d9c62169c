//! Memory service contracts — episodic history and retrieval.
//!
//! The memory service is external; this module defines the two seams the
//! loop consumes. Both are best-effort from the driver's perspective: a
//! failed fetch substitutes empty results, a failed store is logged and
//! dropped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;
use crate::message::PlaybookStep;
use crate::trace::TraceId;

/// One message of episodic session history, newest-last.
///
/// Roles are free-form strings here — the external store owns them and the
/// planner only renders them into the `<session_history>` prompt section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// One retrieval-augmented context match, ordering preserved from retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagMatch {
    pub knowledge_base: String,
    pub id: String,
    pub text: String,
}

/// Keyed episodic store (HTTP side of the memory service).
#[async_trait]
pub trait EpisodicStore: Send + Sync {
    /// Fetch the latest session history for `session_id`. May be empty.
    async fn latest(
        &self,
        trace: &TraceId,
        session_id: &str,
    ) -> Result<Vec<SessionMessage>, MemoryError>;

    /// Append one `(user, assistant)` exchange to the session.
    async fn store_delta(
        &self,
        trace: &TraceId,
        session_id: &str,
        user_prompt: &str,
        assistant_text: &str,
    ) -> Result<(), MemoryError>;

    /// Persist a learned playbook for later retrieval-augmented reuse.
    async fn store_playbook(
        &self,
        trace: &TraceId,
        session_id: &str,
        prompt: &str,
        sequence: &[PlaybookStep],
    ) -> Result<(), MemoryError>;
}

/// Vector-retrieval interface (gRPC side of the memory service).
#[async_trait]
pub trait RagRetriever: Send + Sync {
    /// Fetch up to `top_k` matches for `query` across the given knowledge
    /// bases, in retrieval order.
    async fn retrieve(
        &self,
        trace: &TraceId,
        query: &str,
        top_k: u32,
        knowledge_bases: &[String],
    ) -> Result<Vec<RagMatch>, MemoryError>;
}
