//! Notification publishing for the PAGI agent planner.
//!
//! Fire-and-forget broadcast of lifecycle and result messages on a named
//! Redis pub/sub channel. If the broker is unreachable at startup the
//! publisher degrades to a no-op for the lifetime of the process.

mod publisher;

pub use publisher::{RedisPublisher, NOTIFICATIONS_CHANNEL};
