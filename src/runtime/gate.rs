//! Skip/Gate Evaluator
//!
//! Before each node the engine inspects its direct predecessors. A node
//! is skipped when any predecessor was skipped or failed, or when a
//! predecessor decision gated it off. Skips cascade naturally because
//! the same rule applies at every step of the linear walk.
//!
//! Node *state* is tracked apart from result `status`: a publishing
//! terminal whose delivery soft-failed keeps state `Completed`, so its
//! descendants still run.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::graph::GraphIndex;
use crate::store::ResultStore;

/// Execution state of a visited node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Completed,
    Skipped,
    Failed,
}

impl NodeState {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Decide whether a node must be skipped. Returns the skip reason.
pub fn skip_reason(
    node_id: &str,
    index: &GraphIndex,
    states: &FxHashMap<Arc<str>, NodeState>,
    results: &ResultStore,
) -> Option<String> {
    for parent in index.predecessors(node_id) {
        match states.get(parent) {
            Some(state @ (NodeState::Skipped | NodeState::Failed)) => {
                return Some(format!("Parent {parent} was {}", state.as_str()));
            }
            _ => {}
        }

        if results.get(parent).is_some_and(|r| r.gated_off()) {
            return Some(format!("Decision node {parent} returned false"));
        }
    }
    None
}
