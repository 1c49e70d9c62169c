//! SQLite-backed append-only audit log.
//!
//! One database file, one `events` table, created if absent. WAL journal
//! mode so concurrent request streams don't stall each other on fsync.
//! The pool is capped at a single connection: every in-flight request's
//! writes funnel through one writer, which keeps `created_at` ordering
//! aligned with insertion order. No reader API is exposed in-process.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use pagi_core::audit::{AuditEventType, AuditRecorder};
use pagi_core::error::AuditError;
use pagi_core::trace::TraceId;

/// A durable audit log backed by an embedded SQLite database.
pub struct SqliteAuditLog {
    pool: SqlitePool,
}

impl SqliteAuditLog {
    /// Open (or create) the audit database at `path`.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database
    /// (useful for tests).
    pub async fn new(path: &str) -> Result<Self, AuditError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| AuditError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| AuditError::Storage(format!("Failed to open SQLite: {e}")))?;

        let log = Self { pool };
        log.run_migrations().await?;
        info!("Audit database initialized at {path}");
        Ok(log)
    }

    async fn run_migrations(&self) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                trace_id    TEXT NOT NULL,
                session_id  TEXT NOT NULL,
                event_type  TEXT NOT NULL,
                payload     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AuditError::Storage(format!("events table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_events_trace_session
             ON events(trace_id, session_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AuditError::Storage(format!("trace index: {e}")))?;

        debug!("Audit migrations complete");
        Ok(())
    }
}

#[async_trait]
impl AuditRecorder for SqliteAuditLog {
    async fn record(
        &self,
        trace: &TraceId,
        session_id: &str,
        event: AuditEventType,
        payload: serde_json::Value,
    ) -> Result<(), AuditError> {
        let payload_json = serde_json::to_string(&payload)
            .map_err(|e| AuditError::Serialization(e.to_string()))?;
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);

        sqlx::query(
            "INSERT INTO events (trace_id, session_id, event_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(trace.as_str())
        .bind(session_id)
        .bind(event.as_str())
        .bind(payload_json)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuditError::Storage(format!("INSERT failed: {e}")))?;

        Ok(())
    }
}

/// The degradation target when the audit database cannot be opened at
/// startup: records nothing, never errors. The binary logs the downgrade
/// once when it swaps this in.
pub struct DisabledAuditLog;

#[async_trait]
impl AuditRecorder for DisabledAuditLog {
    async fn record(
        &self,
        _trace: &TraceId,
        _session_id: &str,
        _event: AuditEventType,
        _payload: serde_json::Value,
    ) -> Result<(), AuditError> {
        Ok(())
    }
}
