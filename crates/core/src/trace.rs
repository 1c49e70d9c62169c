//! Request-scoped trace identifiers.
//!
//! A `TraceId` correlates one inbound request across logs, audit rows, RPC
//! metadata, and notification payloads. It is adopted verbatim from the
//! `X-Trace-ID` request header when the caller supplies one, and generated
//! fresh otherwise. Every outbound call carries it: gRPC metadata under the
//! lowercase key (gRPC metadata keys must be lowercase), HTTP requests under
//! the canonical header name.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical HTTP header name for trace propagation.
pub const TRACE_HEADER: &str = "X-Trace-ID";

/// Lowercase key used for gRPC metadata and `http::HeaderName` construction.
pub const TRACE_METADATA_KEY: &str = "x-trace-id";

/// Opaque correlation identifier for one inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(String);

impl TraceId {
    /// Generate a fresh trace id (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Adopt a caller-supplied header value verbatim.
    ///
    /// Returns `None` for blank values so the caller falls back to
    /// [`TraceId::generate`].
    pub fn from_header(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
