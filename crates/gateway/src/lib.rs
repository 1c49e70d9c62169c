//! HTTP gateway for the PAGI agent planner.
//!
//! Exposes the planning endpoint (`POST /plan`, alias `POST /run`) and a
//! health check. Every response carries an `X-Trace-ID` header echoing the
//! trace id used internally — adopted verbatim from the request header when
//! the caller supplied one, generated fresh otherwise.
//!
//! Built on Axum; the planner singleton is shared through router state.
//! Client disconnects become cooperative cancellation: each planning
//! request runs the driver as a detached task with a cancellation token,
//! and a drop guard on the handler future cancels the token when axum
//! drops the handler (disconnect, connection reset), so the driver aborts
//! at its next suspension point and the audit trail records the outcome.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::Extension;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use pagi_agent::Planner;
use pagi_core::trace::{TraceId, TRACE_METADATA_KEY};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub planner: Arc<Planner>,
}

type SharedState = Arc<GatewayState>;

static TRACE_HEADER_NAME: HeaderName = HeaderName::from_static(TRACE_METADATA_KEY);

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/plan", post(plan_handler))
        .route("/run", post(plan_handler))
        .layer(middleware::from_fn(trace_middleware))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server with graceful shutdown.
pub async fn start(planner: Arc<Planner>, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(GatewayState { planner });
    let app = build_router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(port, "agent_planner_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server_shutdown_complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("server_shutdown_start");
}

// ── Middleware ────────────────────────────────────────────────────────────

/// Adopt or generate the request trace id, expose it to handlers through
/// request extensions, echo it on the response, and emit one request log
/// line with method/path/status/latency.
async fn trace_middleware(mut request: Request, next: Next) -> Response {
    let trace = request
        .headers()
        .get(&TRACE_HEADER_NAME)
        .and_then(|value| value.to_str().ok())
        .and_then(TraceId::from_header)
        .unwrap_or_else(TraceId::generate);

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    request.extensions_mut().insert(trace.clone());

    let start = Instant::now();
    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(trace.as_str()) {
        response.headers_mut().insert(&TRACE_HEADER_NAME, value);
    }

    info!(
        trace_id = %trace,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "http_request"
    );

    response
}

// ── Handlers ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Debug, Deserialize)]
struct PlanRequest {
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    session_id: String,
}

#[derive(Serialize)]
struct PlanResponse {
    result: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

async fn plan_handler(
    State(state): State<SharedState>,
    Extension(trace): Extension<TraceId>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid request body");
    };

    if request.prompt.is_empty() || request.session_id.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Prompt and session_id are required",
        );
    }

    let session_id = request.session_id.clone();
    info!(trace_id = %trace, session_id = %session_id, "agent_loop_start");

    // The driver runs as a detached task holding a cancellation token. If
    // the client disconnects, axum drops this handler future; the drop
    // guard then cancels the token and the driver aborts cooperatively at
    // its next suspension point, leaving a `PLAN_ERROR` row behind instead
    // of vanishing mid-turn.
    let cancel = CancellationToken::new();
    let _disconnect_guard = cancel.clone().drop_guard();
    let planner = state.planner.clone();
    let run_trace = trace.clone();
    let task = tokio::spawn(async move {
        planner
            .run(&request.prompt, &request.session_id, &run_trace, &cancel)
            .await
    });

    match task.await {
        Ok(Ok(result)) => {
            info!(trace_id = %trace, session_id = %session_id, "agent_loop_complete");
            (StatusCode::OK, Json(PlanResponse { result })).into_response()
        }
        Ok(Err(e)) => {
            error!(
                trace_id = %trace,
                session_id = %session_id,
                error = %e,
                "agent_loop_failed"
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Agent execution failed")
        }
        Err(e) => {
            error!(trace_id = %trace, session_id = %session_id, error = %e, "agent_loop_panicked");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Agent execution failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use pagi_config::PlannerConfig;
    use pagi_core::audit::{AuditEventType, AuditRecorder};
    use pagi_core::error::{MemoryError, ModelError, NotifyError, ToolError};
    use pagi_core::memory::{
        EpisodicStore, RagMatch, RagRetriever, SessionMessage,
    };
    use pagi_core::message::PlaybookStep;
    use pagi_core::model::{ModelGateway, PlanOutcome};
    use pagi_core::notify::{LifecycleStatus, NotificationPublisher};
    use pagi_core::tool::{ToolCall, ToolExecutor, ToolOutput};
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct FixedModel {
        reply: Result<String, ModelError>,
    }

    #[async_trait]
    impl ModelGateway for FixedModel {
        async fn get_plan(
            &self,
            _trace: &TraceId,
            _prompt: &str,
        ) -> Result<PlanOutcome, ModelError> {
            Ok(PlanOutcome {
                plan: self.reply.clone()?,
                model_name: "mock".into(),
                latency_ms: 1,
            })
        }
    }

    struct NoMemory;

    #[async_trait]
    impl EpisodicStore for NoMemory {
        async fn latest(
            &self,
            _trace: &TraceId,
            _session_id: &str,
        ) -> Result<Vec<SessionMessage>, MemoryError> {
            Ok(vec![])
        }
        async fn store_delta(
            &self,
            _trace: &TraceId,
            _session_id: &str,
            _user_prompt: &str,
            _assistant_text: &str,
        ) -> Result<(), MemoryError> {
            Ok(())
        }
        async fn store_playbook(
            &self,
            _trace: &TraceId,
            _session_id: &str,
            _prompt: &str,
            _sequence: &[PlaybookStep],
        ) -> Result<(), MemoryError> {
            Ok(())
        }
    }

    struct NoRetriever;

    #[async_trait]
    impl RagRetriever for NoRetriever {
        async fn retrieve(
            &self,
            _trace: &TraceId,
            _query: &str,
            _top_k: u32,
            _knowledge_bases: &[String],
        ) -> Result<Vec<RagMatch>, MemoryError> {
            Ok(vec![])
        }
    }

    struct NoTools;

    #[async_trait]
    impl ToolExecutor for NoTools {
        async fn execute(
            &self,
            _trace: &TraceId,
            call: &ToolCall,
        ) -> Result<ToolOutput, ToolError> {
            Err(ToolError::Transport {
                tool_name: call.name.clone(),
                message: "no sandbox in tests".into(),
            })
        }
    }

    #[derive(Default)]
    struct CountingAudit {
        rows: Mutex<Vec<AuditEventType>>,
    }

    #[async_trait]
    impl AuditRecorder for CountingAudit {
        async fn record(
            &self,
            _trace: &TraceId,
            _session_id: &str,
            event: AuditEventType,
            _payload: serde_json::Value,
        ) -> Result<(), pagi_core::error::AuditError> {
            self.rows.lock().unwrap().push(event);
            Ok(())
        }
    }

    struct NoNotifier;

    #[async_trait]
    impl NotificationPublisher for NoNotifier {
        async fn publish_lifecycle(
            &self,
            _trace: &TraceId,
            _session_id: &str,
            _status: LifecycleStatus,
        ) -> Result<(), NotifyError> {
            Ok(())
        }
        async fn publish_result(
            &self,
            _trace: &TraceId,
            _session_id: &str,
            _result: &str,
        ) -> Result<(), NotifyError> {
            Ok(())
        }
    }

    fn test_state(reply: Result<String, ModelError>) -> (SharedState, Arc<CountingAudit>) {
        let audit = Arc::new(CountingAudit::default());
        let planner = Arc::new(Planner::new(
            PlannerConfig::default(),
            Arc::new(FixedModel { reply }),
            Arc::new(NoRetriever),
            Arc::new(NoMemory),
            Arc::new(NoTools),
            audit.clone(),
            Arc::new(NoNotifier),
        ));
        (Arc::new(GatewayState { planner }), audit)
    }

    fn plan_request(body: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri("/plan")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (state, _) = test_state(Ok("hi".into()));
        let app = build_router(state);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn plan_returns_result() {
        let (state, _) = test_state(Ok("hi there".into()));
        let app = build_router(state);

        let response = app
            .oneshot(plan_request(r#"{"prompt":"hello","session_id":"s1"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(&TRACE_HEADER_NAME));
        let body = body_json(response).await;
        assert_eq!(body["result"], "hi there");
    }

    #[tokio::test]
    async fn run_alias_behaves_like_plan() {
        let (state, _) = test_state(Ok("aliased".into()));
        let app = build_router(state);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/run")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"prompt":"p","session_id":"s"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["result"], "aliased");
    }

    #[tokio::test]
    async fn empty_session_id_rejected_before_the_driver() {
        let (state, audit) = test_state(Ok("never called".into()));
        let app = build_router(state);

        let response = app
            .oneshot(plan_request(r#"{"prompt":"x","session_id":""}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Prompt and session_id are required");
        // Rejected pre-driver: no audit rows at all.
        assert!(audit.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_prompt_rejected() {
        let (state, _) = test_state(Ok("x".into()));
        let app = build_router(state);

        let response = app
            .oneshot(plan_request(r#"{"prompt":"","session_id":"s"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn undecodable_body_rejected() {
        let (state, _) = test_state(Ok("x".into()));
        let app = build_router(state);

        let response = app.oneshot(plan_request("not json")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn model_failure_maps_to_500_with_generic_error() {
        let (state, audit) = test_state(Err(ModelError::Rpc {
            message: "secret internal detail".into(),
        }));
        let app = build_router(state);

        let response = app
            .oneshot(plan_request(r#"{"prompt":"x","session_id":"s"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Agent execution failed");
        // The audit trail still recorded the failure.
        assert_eq!(
            *audit.rows.lock().unwrap(),
            vec![AuditEventType::PlanStart, AuditEventType::PlanError]
        );
    }

    #[tokio::test]
    async fn caller_trace_id_adopted_verbatim() {
        let (state, _) = test_state(Ok("hi".into()));
        let app = build_router(state);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/plan")
                    .header("content-type", "application/json")
                    .header("X-Trace-ID", "caller-supplied-id")
                    .body(Body::from(r#"{"prompt":"p","session_id":"s"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        let echoed = response.headers().get(&TRACE_HEADER_NAME).unwrap();
        assert_eq!(echoed.to_str().unwrap(), "caller-supplied-id");
    }

    #[tokio::test]
    async fn fresh_trace_id_generated_when_absent() {
        let (state, _) = test_state(Ok("hi".into()));
        let app = build_router(state);

        let response = app
            .oneshot(plan_request(r#"{"prompt":"p","session_id":"s"}"#))
            .await
            .unwrap();

        let echoed = response.headers().get(&TRACE_HEADER_NAME).unwrap();
        assert!(!echoed.to_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn error_responses_also_carry_trace_header() {
        let (state, _) = test_state(Ok("x".into()));
        let app = build_router(state);

        let response = app
            .oneshot(plan_request(r#"{"prompt":"","session_id":""}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().contains_key(&TRACE_HEADER_NAME));
    }
}
