//! # PAGI Core
//!
//! Domain types, traits, and error definitions for the PAGI agent planner.
//! This crate has **zero framework dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator the planner loop talks to is defined as a trait here.
//! Implementations live in their respective crates (gRPC clients in
//! `pagi-rpc`, the HTTP memory client in `pagi-memory`, the SQLite audit log
//! in `pagi-audit`, the Redis publisher in `pagi-notify`). This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod audit;
pub mod error;
pub mod memory;
pub mod message;
pub mod model;
pub mod notify;
pub mod plan;
pub mod tool;
pub mod trace;

// Re-export key types at crate root for ergonomics
pub use audit::{AuditEventType, AuditRecorder};
pub use error::{Error, Result};
pub use memory::{EpisodicStore, RagMatch, RagRetriever, SessionMessage};
pub use message::{PlaybookStep, Role};
pub use model::{ModelGateway, PlanOutcome};
pub use notify::{LifecycleStatus, NotificationPublisher};
pub use plan::{interpret, PlanDecision};
pub use tool::{ToolCall, ToolExecutor, ToolOutput};
pub use trace::{TraceId, TRACE_HEADER, TRACE_METADATA_KEY};
