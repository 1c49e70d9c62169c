//! Configuration loading and validation for the PAGI agent planner.
//!
//! Configuration is process-wide, read once at startup from environment
//! variables, and validated before any collaborator is dialed. There is no
//! config file layer — the planner runs containerized next to its
//! collaborators and environment variables are the deployment surface.

use thiserror::Error;

/// Default turn budget, also the coercion target for invalid values.
pub const DEFAULT_MAX_TURNS: u32 = 3;

/// Default number of retrieval matches requested per knowledge-base query.
pub const DEFAULT_TOP_K: u32 = 3;

/// Default minimum playbook length required for persistence.
///
/// Guards against persisting trivial echoes: a real tool-using run is at
/// least `user + assistant + tool_result (+ final assistant)`.
pub const DEFAULT_PLAYBOOK_MIN_LEN: usize = 3;

/// The process-wide planner configuration.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Turn budget per request (≥ 1; invalid values coerced to the default)
    pub max_turns: u32,

    /// Retrieval matches requested per query
    pub top_k: u32,

    /// Minimum playbook sequence length required before persistence
    pub playbook_min_len: usize,

    /// Ordered knowledge bases queried for RAG context
    pub knowledge_bases: Vec<String>,

    /// Model gateway gRPC address (dial failure is fatal at startup)
    pub model_gateway_addr: String,

    /// Memory service retrieval gRPC address (degradation-only)
    pub memory_grpc_addr: String,

    /// Memory service HTTP base URL (degradation-only)
    pub memory_http_url: String,

    /// Sandbox executor gRPC address (dial failure is fatal at startup)
    pub sandbox_grpc_addr: String,

    /// Audit database file path
    pub audit_db_path: String,

    /// Notification broker address
    pub redis_addr: String,

    /// HTTP listen port
    pub port: u16,

    /// Per-call model RPC timeout, layered under the request deadline
    pub model_timeout_secs: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            top_k: DEFAULT_TOP_K,
            playbook_min_len: DEFAULT_PLAYBOOK_MIN_LEN,
            knowledge_bases: default_knowledge_bases(),
            model_gateway_addr: "http://localhost:50051".into(),
            memory_grpc_addr: "http://localhost:50052".into(),
            memory_http_url: "http://localhost:8003".into(),
            sandbox_grpc_addr: "http://localhost:50053".into(),
            audit_db_path: "./pagi_audit.db".into(),
            redis_addr: "redis://localhost:6379".into(),
            port: 8080,
            model_timeout_secs: 5,
        }
    }
}

/// Mind-KB is included so the planner retrieves evolving playbooks through
/// the same RAG call as domain knowledge.
fn default_knowledge_bases() -> Vec<String> {
    vec![
        "Mind-KB".into(),
        "Domain-KB".into(),
        "Body-KB".into(),
        "Soul-KB".into(),
    ]
}

impl PlannerConfig {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_turns: env_turns("AGENT_MAX_TURNS"),
            top_k: env_u32("AGENT_RAG_TOP_K", DEFAULT_TOP_K),
            playbook_min_len: env_u32("AGENT_PLAYBOOK_MIN_LEN", DEFAULT_PLAYBOOK_MIN_LEN as u32)
                as usize,
            knowledge_bases: default_knowledge_bases(),
            model_gateway_addr: env_or("MODEL_GATEWAY_ADDR", &defaults.model_gateway_addr),
            memory_grpc_addr: env_or("MEMORY_GRPC_ADDR", &defaults.memory_grpc_addr),
            memory_http_url: env_or("MEMORY_URL", &defaults.memory_http_url),
            sandbox_grpc_addr: env_or("RUST_SANDBOX_GRPC_ADDR", &defaults.sandbox_grpc_addr),
            audit_db_path: env_or("PAGI_AUDIT_DB_PATH", &defaults.audit_db_path),
            redis_addr: env_or("REDIS_ADDR", &defaults.redis_addr),
            port: env_port("AGENT_PLANNER_PORT", defaults.port),
            model_timeout_secs: defaults.model_timeout_secs,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_turns == 0 {
            return Err(ConfigError::Validation("max_turns must be ≥ 1".into()));
        }
        if self.knowledge_bases.is_empty() {
            return Err(ConfigError::Validation(
                "at least one knowledge base is required".into(),
            ));
        }
        if self.memory_http_url.trim_end_matches('/').is_empty() {
            return Err(ConfigError::Validation(
                "memory_http_url must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn env_or(key: &str, fallback: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => fallback.to_string(),
    }
}

fn env_u32(key: &str, fallback: u32) -> u32 {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => match v.trim().parse::<i64>() {
            Ok(n) if n >= 0 && n <= u32::MAX as i64 => n as u32,
            _ => {
                tracing::warn!(key, value = %v, fallback, "Invalid numeric env var, using fallback");
                fallback
            }
        },
        _ => fallback,
    }
}

fn env_port(key: &str, fallback: u16) -> u16 {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => match v.trim().parse::<u16>() {
            Ok(port) => port,
            Err(_) => {
                tracing::warn!(key, value = %v, fallback, "Invalid port env var, using fallback");
                fallback
            }
        },
        _ => fallback,
    }
}

/// `AGENT_MAX_TURNS` has its own rule: values ≤ 0 (or unparsable) are
/// coerced to the default rather than rejected.
fn env_turns(key: &str) -> u32 {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => match v.trim().parse::<i64>() {
            Ok(n) if n >= 1 => n as u32,
            _ => {
                tracing::warn!(key, value = %v, "max_turns must be ≥ 1, coercing to default");
                DEFAULT_MAX_TURNS
            }
        },
        _ => DEFAULT_MAX_TURNS,
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = PlannerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_turns, 3);
        assert_eq!(cfg.top_k, 3);
        assert_eq!(cfg.playbook_min_len, 3);
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn default_knowledge_bases_ordered() {
        let cfg = PlannerConfig::default();
        assert_eq!(
            cfg.knowledge_bases,
            vec!["Mind-KB", "Domain-KB", "Body-KB", "Soul-KB"]
        );
    }

    #[test]
    fn zero_max_turns_rejected_by_validation() {
        let cfg = PlannerConfig {
            max_turns: 0,
            ..PlannerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_knowledge_bases_rejected() {
        let cfg = PlannerConfig {
            knowledge_bases: vec![],
            ..PlannerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    // Env-var parsing is exercised through the helpers directly rather than
    // process-global set_var juggling, which races across test threads.

    #[test]
    fn env_or_falls_back_when_unset() {
        assert_eq!(env_or("PAGI_TEST_UNSET_VAR", "fallback"), "fallback");
    }

    #[test]
    fn env_u32_falls_back_when_unset() {
        assert_eq!(env_u32("PAGI_TEST_UNSET_NUM", 7), 7);
    }

    #[test]
    fn env_turns_defaults_when_unset() {
        assert_eq!(env_turns("PAGI_TEST_UNSET_TURNS"), DEFAULT_MAX_TURNS);
    }

    #[test]
    fn env_port_defaults_when_unset() {
        assert_eq!(env_port("PAGI_TEST_UNSET_PORT", 8080), 8080);
    }
}
