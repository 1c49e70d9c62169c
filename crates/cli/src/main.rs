//! PAGI agent planner — the service entry point.
//!
//! Startup order matters: the model gateway and sandbox are dialed eagerly
//! (unreachable addresses are fatal), the memory retrieval channel is dialed
//! lazily, and the audit database and notification broker degrade to no-ops
//! when unavailable.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use pagi_agent::Planner;
use pagi_audit::{DisabledAuditLog, SqliteAuditLog};
use pagi_config::PlannerConfig;
use pagi_core::audit::AuditRecorder;
use pagi_core::notify::NotificationPublisher;
use pagi_memory::HttpEpisodicStore;
use pagi_notify::RedisPublisher;
use pagi_rpc::{GrpcModelGateway, GrpcRagRetriever, GrpcToolExecutor};

#[derive(Parser)]
#[command(
    name = "pagi-planner",
    about = "PAGI Agent Planner — multi-turn planning orchestrator",
    version
)]
struct Cli {
    /// Override the HTTP listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let mut cfg = PlannerConfig::from_env();
    if let Some(port) = cli.port {
        cfg.port = port;
    }
    cfg.validate()?;

    // Fatal dials: the planner cannot run without a model or a sandbox.
    let model_channel = pagi_rpc::dial(&cfg.model_gateway_addr)
        .await
        .map_err(|e| format!("dial model gateway at {}: {e}", cfg.model_gateway_addr))?;
    info!(addr = %cfg.model_gateway_addr, "Model gateway connected");

    let sandbox_channel = pagi_rpc::dial(&cfg.sandbox_grpc_addr)
        .await
        .map_err(|e| format!("dial sandbox at {}: {e}", cfg.sandbox_grpc_addr))?;
    info!(addr = %cfg.sandbox_grpc_addr, "Sandbox executor connected");

    // The memory service is degradation-only, so its channel dials lazily.
    let memory_channel = pagi_rpc::dial_lazy(&cfg.memory_grpc_addr)
        .map_err(|e| format!("invalid memory address {}: {e}", cfg.memory_grpc_addr))?;

    let model = Arc::new(GrpcModelGateway::new(
        model_channel,
        Duration::from_secs(cfg.model_timeout_secs),
    ));
    let retriever = Arc::new(GrpcRagRetriever::new(memory_channel));
    let tools = Arc::new(GrpcToolExecutor::new(sandbox_channel));
    let episodic = Arc::new(HttpEpisodicStore::new(&cfg.memory_http_url)?);

    let audit: Arc<dyn AuditRecorder> = match SqliteAuditLog::new(&cfg.audit_db_path).await {
        Ok(log) => Arc::new(log),
        Err(e) => {
            warn!(
                path = %cfg.audit_db_path,
                error = %e,
                "Audit database unavailable; auditing disabled for this process"
            );
            Arc::new(DisabledAuditLog)
        }
    };

    let notifier: Arc<dyn NotificationPublisher> =
        Arc::new(RedisPublisher::connect(&cfg.redis_addr).await);

    let port = cfg.port;
    let planner = Arc::new(Planner::new(
        cfg, model, retriever, episodic, tools, audit, notifier,
    ));

    pagi_gateway::start(planner, port).await
}
