//! gRPC transport for the planner's external collaborators.
//!
//! Three services, two proto service definitions: the model gateway and the
//! memory service's retrieval side both speak `ModelGateway`; the sandbox
//! speaks `ToolService`. Each client here implements the corresponding
//! `pagi-core` trait over a shared long-lived [`tonic::transport::Channel`].
//!
//! Tonic clients are cheap to clone and share the underlying connection, so
//! one channel per collaborator is dialed at startup and cloned per call.

/// Generated protobuf/tonic stubs for the `pagi` package.
pub mod proto {
    tonic::include_proto!("pagi");
}

mod client;

pub use client::{
    attach_trace, dial, dial_lazy, GrpcModelGateway, GrpcRagRetriever, GrpcToolExecutor,
};
