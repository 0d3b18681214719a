//! EventLog - append-only execution audit trail
//!
//! Events carry a monotonic sequence id and a timestamp relative to log
//! creation, so observers can replay exactly what the engine did and in
//! which order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

/// Single event in the execution log
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// Monotonic sequence id (for ordering)
    pub id: u64,
    /// Time since log creation (ms)
    pub timestamp_ms: u64,
    /// Event type and data
    pub kind: EventKind,
}

/// All event types, two levels (execution / node)
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // ═══════════════════════════════════════════
    // EXECUTION LEVEL
    // ═══════════════════════════════════════════
    ExecutionStarted {
        execution_id: Uuid,
        node_count: usize,
    },
    ExecutionCompleted {
        execution_id: Uuid,
        duration_ms: u64,
    },
    ExecutionFailed {
        execution_id: Uuid,
        error: String,
        failed_node: Option<Arc<str>>,
    },

    // ═══════════════════════════════════════════
    // NODE LEVEL
    // ═══════════════════════════════════════════
    NodeStarted {
        execution_id: Uuid,
        node_id: Arc<str>,
        kind: String,
    },
    NodeSkipped {
        execution_id: Uuid,
        node_id: Arc<str>,
        reason: String,
    },
    NodeCompleted {
        execution_id: Uuid,
        node_id: Arc<str>,
        duration_ms: u64,
    },
    NodeFailed {
        execution_id: Uuid,
        node_id: Arc<str>,
        error: String,
        duration_ms: u64,
    },

    // ═══════════════════════════════════════════
    // REPORT
    // ═══════════════════════════════════════════
    ReportGenerated {
        execution_id: Uuid,
    },
    ReportFailed {
        execution_id: Uuid,
        error: String,
    },
}

impl EventKind {
    /// Extract node_id if the event is node-related
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::NodeStarted { node_id, .. }
            | Self::NodeSkipped { node_id, .. }
            | Self::NodeCompleted { node_id, .. }
            | Self::NodeFailed { node_id, .. } => Some(node_id),
            _ => None,
        }
    }
}

/// Thread-safe, append-only event log shared across executions
#[derive(Clone)]
pub struct EventLog {
    events: Arc<RwLock<Vec<Event>>>,
    next_id: Arc<AtomicU64>,
    start: Instant,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(0)),
            start: Instant::now(),
        }
    }

    pub fn emit(&self, kind: EventKind) {
        let event = Event {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            timestamp_ms: self.start.elapsed().as_millis() as u64,
            kind,
        };
        self.events.write().push(event);
    }

    /// Snapshot of all events in emission order
    pub fn events(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    /// Events belonging to one execution
    pub fn filter_execution(&self, execution_id: Uuid) -> Vec<Event> {
        self.events
            .read()
            .iter()
            .filter(|e| match &e.kind {
                EventKind::ExecutionStarted { execution_id: id, .. }
                | EventKind::ExecutionCompleted { execution_id: id, .. }
                | EventKind::ExecutionFailed { execution_id: id, .. }
                | EventKind::NodeStarted { execution_id: id, .. }
                | EventKind::NodeSkipped { execution_id: id, .. }
                | EventKind::NodeCompleted { execution_id: id, .. }
                | EventKind::NodeFailed { execution_id: id, .. }
                | EventKind::ReportGenerated { execution_id: id }
                | EventKind::ReportFailed { execution_id: id, .. } => *id == execution_id,
            })
            .cloned()
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.events()).unwrap_or(serde_json::Value::Null)
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
