//! Event log for workflow executions
//!
//! Append-only audit trail of one engine process. Key types:
//! - `Event`: envelope with id + timestamp + kind
//! - `EventKind`: execution-level and node-level variants
//! - `EventLog`: thread-safe, append-only log

mod log;

pub use log::{Event, EventKind, EventLog};
