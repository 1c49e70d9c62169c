//! The Redis-backed notification publisher.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{info, warn};

use pagi_core::error::NotifyError;
use pagi_core::notify::{
    LifecycleNotification, LifecycleStatus, NotificationPublisher, ResultNotification,
};
use pagi_core::trace::TraceId;

/// The single pub/sub topic all planner notifications go out on.
pub const NOTIFICATIONS_CHANNEL: &str = "pagi_notifications";

/// Best-effort publisher over a shared multiplexed Redis connection.
///
/// Connection state is decided once at startup: an unreachable broker yields
/// a disabled publisher whose publishes succeed as no-ops.
pub struct RedisPublisher {
    conn: Option<MultiplexedConnection>,
}

impl RedisPublisher {
    /// Connect to the broker, degrading to a no-op publisher on failure.
    pub async fn connect(addr: &str) -> Self {
        let url = normalize_addr(addr);
        match Self::try_connect(&url).await {
            Ok(conn) => {
                info!(addr = %url, "Notification broker connected");
                Self { conn: Some(conn) }
            }
            Err(e) => {
                warn!(
                    addr = %url,
                    error = %e,
                    "Notification broker unreachable; publishing disabled for this process"
                );
                Self { conn: None }
            }
        }
    }

    /// A publisher that never publishes. Used in tests and as the
    /// degradation target.
    pub fn disabled() -> Self {
        Self { conn: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    async fn try_connect(url: &str) -> Result<MultiplexedConnection, redis::RedisError> {
        let client = redis::Client::open(url)?;
        client.get_multiplexed_async_connection().await
    }

    async fn publish_payload(&self, payload: String) -> Result<(), NotifyError> {
        let Some(conn) = &self.conn else {
            return Ok(());
        };
        let mut conn = conn.clone();
        conn.publish::<_, _, ()>(NOTIFICATIONS_CHANNEL, payload)
            .await
            .map_err(|e| NotifyError::Publish(e.to_string()))
    }
}

/// Accept both `host:port` and full `redis://` URLs.
fn normalize_addr(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("redis://{addr}")
    }
}

#[async_trait]
impl NotificationPublisher for RedisPublisher {
    async fn publish_lifecycle(
        &self,
        trace: &TraceId,
        session_id: &str,
        status: LifecycleStatus,
    ) -> Result<(), NotifyError> {
        let message = LifecycleNotification::now(trace, session_id, status);
        let payload = serde_json::to_string(&message)
            .map_err(|e| NotifyError::Publish(e.to_string()))?;
        self.publish_payload(payload).await
    }

    async fn publish_result(
        &self,
        trace: &TraceId,
        session_id: &str,
        result: &str,
    ) -> Result<(), NotifyError> {
        let message = ResultNotification::now(trace, session_id, result);
        let payload = serde_json::to_string(&message)
            .map_err(|e| NotifyError::Publish(e.to_string()))?;
        self.publish_payload(payload).await
    }
}
