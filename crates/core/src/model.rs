//! Model gateway contract — the abstraction over the planning LLM.
//!
//! The gateway receives the fully assembled planner input and returns an
//! opaque plan string; only the plan interpreter ever inspects its shape.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::trace::TraceId;

/// One planning call's result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOutcome {
    /// The raw plan string (tool-call JSON or final prose)
    pub plan: String,

    /// Which model produced the plan
    pub model_name: String,

    /// Gateway-reported generation latency
    pub latency_ms: i64,
}

/// The model gateway seam.
///
/// A failed call here is the only fatal inner-loop error class: the driver
/// records `PLAN_ERROR` and aborts the request.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn get_plan(&self, trace: &TraceId, prompt: &str) -> Result<PlanOutcome, ModelError>;
}
