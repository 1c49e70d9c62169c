//! gRPC client implementations of the collaborator traits.

use std::time::Duration;

use async_trait::async_trait;
use tonic::metadata::MetadataValue;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

use pagi_core::error::{MemoryError, ModelError, ToolError};
use pagi_core::memory::{RagMatch, RagRetriever};
use pagi_core::model::{ModelGateway, PlanOutcome};
use pagi_core::tool::{ToolCall, ToolExecutor, ToolOutput};
use pagi_core::trace::{TraceId, TRACE_METADATA_KEY};

use crate::proto;
use crate::proto::model_gateway_client::ModelGatewayClient;
use crate::proto::tool_service_client::ToolServiceClient;

/// Dial a collaborator eagerly. Used for the model gateway and the sandbox,
/// where an unreachable address at startup is fatal.
pub async fn dial(addr: &str) -> Result<Channel, tonic::transport::Error> {
    Endpoint::from_shared(normalize_addr(addr))?.connect().await
}

/// Dial a collaborator lazily. Used for the memory retrieval service, which
/// is degradation-only: a down memory service surfaces as per-call errors
/// the driver absorbs, not as a startup failure.
pub fn dial_lazy(addr: &str) -> Result<Channel, tonic::transport::Error> {
    Ok(Endpoint::from_shared(normalize_addr(addr))?.connect_lazy())
}

/// Accept both `host:port` and full-URI addresses.
fn normalize_addr(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    }
}

/// Forward the trace id as outgoing request metadata.
pub fn attach_trace<T>(request: &mut tonic::Request<T>, trace: &TraceId) {
    if let Ok(value) = MetadataValue::try_from(trace.as_str()) {
        request.metadata_mut().insert(TRACE_METADATA_KEY, value);
    }
}

/// The planning model gateway over gRPC.
pub struct GrpcModelGateway {
    client: ModelGatewayClient<Channel>,
    timeout: Duration,
}

impl GrpcModelGateway {
    /// `timeout` is the per-call ceiling layered under the request deadline.
    pub fn new(channel: Channel, timeout: Duration) -> Self {
        Self {
            client: ModelGatewayClient::new(channel),
            timeout,
        }
    }
}

#[async_trait]
impl ModelGateway for GrpcModelGateway {
    async fn get_plan(&self, trace: &TraceId, prompt: &str) -> Result<PlanOutcome, ModelError> {
        let mut client = self.client.clone();
        let mut request = tonic::Request::new(proto::PlanRequest {
            prompt: prompt.to_string(),
        });
        attach_trace(&mut request, trace);

        let response = tokio::time::timeout(self.timeout, client.get_plan(request))
            .await
            .map_err(|_| ModelError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|status| ModelError::Rpc {
                message: status.to_string(),
            })?
            .into_inner();

        debug!(
            trace_id = %trace,
            model = %response.model_name,
            latency_ms = response.latency_ms,
            "GetPlan completed"
        );

        Ok(PlanOutcome {
            plan: response.plan,
            model_name: response.model_name,
            latency_ms: response.latency_ms,
        })
    }
}

/// The memory service's retrieval side over gRPC.
pub struct GrpcRagRetriever {
    client: ModelGatewayClient<Channel>,
}

impl GrpcRagRetriever {
    pub fn new(channel: Channel) -> Self {
        Self {
            client: ModelGatewayClient::new(channel),
        }
    }
}

#[async_trait]
impl RagRetriever for GrpcRagRetriever {
    async fn retrieve(
        &self,
        trace: &TraceId,
        query: &str,
        top_k: u32,
        knowledge_bases: &[String],
    ) -> Result<Vec<RagMatch>, MemoryError> {
        let mut client = self.client.clone();
        let mut request = tonic::Request::new(proto::RagContextRequest {
            query: query.to_string(),
            top_k: top_k as i32,
            knowledge_bases: knowledge_bases.to_vec(),
        });
        attach_trace(&mut request, trace);

        let response = client
            .get_rag_context(request)
            .await
            .map_err(|status| MemoryError::Retrieval(status.to_string()))?
            .into_inner();

        Ok(response.matches.into_iter().map(rag_match_from_proto).collect())
    }
}

fn rag_match_from_proto(m: proto::RagMatch) -> RagMatch {
    RagMatch {
        knowledge_base: m.knowledge_base,
        id: m.id,
        text: m.text,
    }
}

/// The sandbox tool service over gRPC.
pub struct GrpcToolExecutor {
    client: ToolServiceClient<Channel>,
}

impl GrpcToolExecutor {
    pub fn new(channel: Channel) -> Self {
        Self {
            client: ToolServiceClient::new(channel),
        }
    }
}

#[async_trait]
impl ToolExecutor for GrpcToolExecutor {
    async fn execute(&self, trace: &TraceId, call: &ToolCall) -> Result<ToolOutput, ToolError> {
        let args_json =
            serde_json::to_string(&call.args).map_err(|e| ToolError::Transport {
                tool_name: call.name.clone(),
                message: format!("serialize args: {e}"),
            })?;

        let mut client = self.client.clone();
        let mut request = tonic::Request::new(proto::ToolRequest {
            tool_name: call.name.clone(),
            args_json,
        });
        attach_trace(&mut request, trace);

        let response = client
            .execute_tool(request)
            .await
            .map_err(|status| ToolError::Transport {
                tool_name: call.name.clone(),
                message: status.to_string(),
            })?
            .into_inner();

        Ok(ToolOutput {
            status: response.status,
            stdout: response.stdout,
            stderr: response.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_leaves_full_uris_alone() {
        assert_eq!(
            normalize_addr("http://gateway:50051"),
            "http://gateway:50051"
        );
    }

    #[test]
    fn normalize_prefixes_bare_host_port() {
        assert_eq!(normalize_addr("localhost:50051"), "http://localhost:50051");
    }

    #[test]
    fn attach_trace_uses_lowercase_key() {
        let trace = TraceId::from_header("trace-42").unwrap();
        let mut request = tonic::Request::new(proto::PlanRequest {
            prompt: "p".into(),
        });
        attach_trace(&mut request, &trace);
        let value = request.metadata().get(TRACE_METADATA_KEY).unwrap();
        assert_eq!(value.to_str().unwrap(), "trace-42");
    }

    #[test]
    fn rag_match_conversion_preserves_fields() {
        let converted = rag_match_from_proto(proto::RagMatch {
            knowledge_base: "Domain-KB".into(),
            id: "doc-7".into(),
            text: "context".into(),
        });
        assert_eq!(converted.knowledge_base, "Domain-KB");
        assert_eq!(converted.id, "doc-7");
        assert_eq!(converted.text, "context");
    }
}
