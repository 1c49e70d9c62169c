//! The turn-bounded planner state machine.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pagi_config::{PlannerConfig, DEFAULT_MAX_TURNS};
use pagi_core::audit::{AuditEventType, AuditRecorder};
use pagi_core::error::Error;
use pagi_core::memory::{EpisodicStore, RagRetriever};
use pagi_core::message::PlaybookStep;
use pagi_core::model::ModelGateway;
use pagi_core::notify::{LifecycleStatus, NotificationPublisher};
use pagi_core::plan::{interpret, PlanDecision};
use pagi_core::tool::ToolExecutor;
use pagi_core::trace::TraceId;

use crate::prompt::{build_followup_prompt, build_planner_input};

/// Returned verbatim when the turn budget runs out. Policy, not an error:
/// the HTTP layer serves it with a success status.
pub const MAX_TURNS_SENTINEL: &str = "Max turns reached; unable to complete request.";

/// The planner singleton.
///
/// Owns the long-lived collaborator handles; created once at startup and
/// shared across requests. Per-request state (working prompt, playbook
/// sequence, turn counter) is owned entirely by each [`Planner::run`]
/// invocation — nothing mutable crosses requests.
pub struct Planner {
    cfg: PlannerConfig,
    model: Arc<dyn ModelGateway>,
    retriever: Arc<dyn RagRetriever>,
    episodic: Arc<dyn EpisodicStore>,
    tools: Arc<dyn ToolExecutor>,
    audit: Arc<dyn AuditRecorder>,
    notifier: Arc<dyn NotificationPublisher>,
}

impl Planner {
    pub fn new(
        cfg: PlannerConfig,
        model: Arc<dyn ModelGateway>,
        retriever: Arc<dyn RagRetriever>,
        episodic: Arc<dyn EpisodicStore>,
        tools: Arc<dyn ToolExecutor>,
        audit: Arc<dyn AuditRecorder>,
        notifier: Arc<dyn NotificationPublisher>,
    ) -> Self {
        Self {
            cfg,
            model,
            retriever,
            episodic,
            tools,
            audit,
            notifier,
        }
    }

    /// Drive one request to completion.
    ///
    /// Returns the model-authored final answer, or [`MAX_TURNS_SENTINEL`]
    /// when the turn budget runs out. Exactly two error classes reach the
    /// caller: a failed model call, and cancellation of `cancel` mid-turn.
    /// Every other collaborator failure is absorbed here.
    ///
    /// Cancellation is honored at every suspension point except the audit
    /// writes themselves: each collaborator await races against `cancel`,
    /// and losing the race drops the in-flight future (aborting the
    /// underlying RPC/HTTP call), records `PLAN_ERROR` with
    /// `reason = cancelled`, skips all further notifications, and returns
    /// [`Error::Cancelled`].
    pub async fn run(
        &self,
        prompt: &str,
        session_id: &str,
        trace: &TraceId,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        let base_prompt = prompt.to_string();
        let mut working_prompt = base_prompt.clone();
        let max_turns = if self.cfg.max_turns == 0 {
            DEFAULT_MAX_TURNS
        } else {
            self.cfg.max_turns
        };

        self.record_step(
            trace,
            session_id,
            AuditEventType::PlanStart,
            json!({
                "prompt": base_prompt.as_str(),
                "max_turns": max_turns,
                "top_k": self.cfg.top_k,
                "kbs": self.cfg.knowledge_bases.clone(),
            }),
        )
        .await;
        self.guard(
            cancel,
            trace,
            session_id,
            self.publish_lifecycle(trace, session_id, LifecycleStatus::Started),
        )
        .await?;

        // Playbook sequence for this run: user prompt + plan/tool-result
        // pairs + final answer. Persisted only on tool-using completions.
        let mut playbook = vec![PlaybookStep::user(&base_prompt)];
        let mut had_tool_step = false;

        for turn in 1..=max_turns {
            debug!(trace_id = %trace, session_id, turn, "Planner turn starting");

            // ── CONTEXT ── both fetches are best-effort: empty on failure.
            let history = match self
                .guard(cancel, trace, session_id, self.episodic.latest(trace, session_id))
                .await?
            {
                Ok(history) => history,
                Err(e) => {
                    warn!(trace_id = %trace, session_id, error = %e, "Session history unavailable");
                    Vec::new()
                }
            };
            let matches = match self
                .guard(
                    cancel,
                    trace,
                    session_id,
                    self.retriever.retrieve(
                        trace,
                        &working_prompt,
                        self.cfg.top_k,
                        &self.cfg.knowledge_bases,
                    ),
                )
                .await?
            {
                Ok(matches) => matches,
                Err(e) => {
                    warn!(trace_id = %trace, session_id, error = %e, "RAG context unavailable");
                    Vec::new()
                }
            };

            // ── PLAN ── the one fatal inner-loop transport error class.
            let planner_input = build_planner_input(&history, &matches, &working_prompt);
            let outcome = match self
                .guard(
                    cancel,
                    trace,
                    session_id,
                    self.model.get_plan(trace, &planner_input),
                )
                .await?
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.record_step(
                        trace,
                        session_id,
                        AuditEventType::PlanError,
                        json!({"error": e.to_string()}),
                    )
                    .await;
                    return Err(e.into());
                }
            };
            let plan = outcome.plan;
            self.record_step(
                trace,
                session_id,
                AuditEventType::PlanModelResponse,
                json!({"plan": plan.as_str()}),
            )
            .await;

            // ── INTERPRET ──
            let call = match interpret(&plan) {
                PlanDecision::ToolCall(call) => call,
                PlanDecision::FinalAnswer => {
                    return self
                        .finalize(
                            trace,
                            session_id,
                            &base_prompt,
                            plan,
                            playbook,
                            had_tool_step,
                            cancel,
                        )
                        .await;
                }
            };

            // ── TOOL ── audit before dispatch.
            self.record_step(
                trace,
                session_id,
                AuditEventType::ToolCall,
                json!({"tool": call.name.as_str(), "args": call.args.clone()}),
            )
            .await;

            let output = match self
                .guard(cancel, trace, session_id, self.tools.execute(trace, &call))
                .await?
            {
                Ok(output) => output,
                Err(e) => {
                    self.record_step(
                        trace,
                        session_id,
                        AuditEventType::ToolError,
                        json!({"tool": call.name.as_str(), "error": e.to_string()}),
                    )
                    .await;
                    // Feed the failure back so the model can route around it.
                    working_prompt.push_str("\n\nTool error: ");
                    working_prompt.push_str(&e.to_string());
                    continue;
                }
            };

            let output_json = output.to_json_string();
            self.record_step(
                trace,
                session_id,
                AuditEventType::ToolResult,
                json!({"tool": call.name.as_str(), "output": output_json.as_str()}),
            )
            .await;

            had_tool_step = true;
            playbook.push(PlaybookStep::assistant(&plan));
            playbook.push(PlaybookStep::tool_result(&output_json));

            // ── FEEDBACK ──
            working_prompt = build_followup_prompt(&working_prompt, &plan, &output_json);
            self.guard(
                cancel,
                trace,
                session_id,
                self.store_delta(trace, session_id, "[tool-plan]", &plan),
            )
            .await?;
            self.guard(
                cancel,
                trace,
                session_id,
                self.store_delta(trace, session_id, "[tool-output]", &output_json),
            )
            .await?;
        }

        warn!(
            trace_id = %trace,
            session_id,
            turns = max_turns,
            "Turn budget exhausted without a final answer"
        );
        Ok(MAX_TURNS_SENTINEL.to_string())
    }

    /// The FINALIZE path: the model answered with prose.
    async fn finalize(
        &self,
        trace: &TraceId,
        session_id: &str,
        base_prompt: &str,
        plan: String,
        mut playbook: Vec<PlaybookStep>,
        had_tool_step: bool,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        playbook.push(PlaybookStep::assistant(&plan));
        self.record_step(
            trace,
            session_id,
            AuditEventType::PlanEnd,
            json!({"result": plan.as_str()}),
        )
        .await;

        // Everything after PLAN_END is best-effort tail work. The stream
        // already has its terminal row, so a cancellation landing here only
        // stops the remaining steps — it must not add a second terminal.
        let finish = async {
            // Persist the playbook only when this run actually used a tool
            // and is long enough to be worth replaying.
            if had_tool_step && playbook.len() >= self.cfg.playbook_min_len {
                if let Err(e) = self
                    .episodic
                    .store_playbook(trace, session_id, base_prompt, &playbook)
                    .await
                {
                    warn!(trace_id = %trace, session_id, error = %e, "Playbook persistence failed");
                }
            }

            self.store_delta(trace, session_id, base_prompt, &plan).await;
            self.publish_result(trace, session_id, &plan).await;
            self.publish_lifecycle(trace, session_id, LifecycleStatus::Completed)
                .await;
        };
        if cancel.run_until_cancelled(finish).await.is_none() {
            warn!(trace_id = %trace, session_id, "Request cancelled during finalization");
            return Err(Error::Cancelled);
        }

        info!(trace_id = %trace, session_id, "Planner run completed");
        Ok(plan)
    }

    /// Race one collaborator await against request cancellation.
    ///
    /// Losing the race drops `fut` (aborting the in-flight outbound call),
    /// records the terminal `PLAN_ERROR` row with `reason = cancelled` —
    /// that audit write itself runs to completion so the stream is never
    /// left without its abort marker — and surfaces [`Error::Cancelled`].
    async fn guard<T>(
        &self,
        cancel: &CancellationToken,
        trace: &TraceId,
        session_id: &str,
        fut: impl std::future::Future<Output = T>,
    ) -> Result<T, Error> {
        match cancel.run_until_cancelled(fut).await {
            Some(value) => Ok(value),
            None => {
                self.record_step(
                    trace,
                    session_id,
                    AuditEventType::PlanError,
                    json!({"error": "request cancelled", "reason": "cancelled"}),
                )
                .await;
                warn!(trace_id = %trace, session_id, "Request cancelled mid-turn");
                Err(Error::Cancelled)
            }
        }
    }

    async fn record_step(
        &self,
        trace: &TraceId,
        session_id: &str,
        event: AuditEventType,
        payload: Value,
    ) {
        if let Err(e) = self.audit.record(trace, session_id, event, payload).await {
            warn!(trace_id = %trace, session_id, event = %event, error = %e, "Audit write failed");
        }
    }

    async fn store_delta(
        &self,
        trace: &TraceId,
        session_id: &str,
        user_prompt: &str,
        assistant_text: &str,
    ) {
        if let Err(e) = self
            .episodic
            .store_delta(trace, session_id, user_prompt, assistant_text)
            .await
        {
            warn!(trace_id = %trace, session_id, error = %e, "Session delta store failed");
        }
    }

    async fn publish_lifecycle(
        &self,
        trace: &TraceId,
        session_id: &str,
        status: LifecycleStatus,
    ) {
        if let Err(e) = self
            .notifier
            .publish_lifecycle(trace, session_id, status)
            .await
        {
            warn!(trace_id = %trace, session_id, error = %e, "Lifecycle notification failed");
        }
    }

    async fn publish_result(&self, trace: &TraceId, session_id: &str, result: &str) {
        if let Err(e) = self.notifier.publish_result(trace, session_id, result).await {
            warn!(trace_id = %trace, session_id, error = %e, "Result notification failed");
        }
    }
}
