//! Audit log implementations for the PAGI agent planner.
//!
//! The durable implementation is [`SqliteAuditLog`]; [`DisabledAuditLog`]
//! is the degradation target when the database cannot be opened at startup.

mod sqlite;

pub use sqlite::{DisabledAuditLog, SqliteAuditLog};
