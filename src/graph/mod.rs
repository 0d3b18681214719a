//! Workflow graph: definition types, shape validation, scheduling

mod schedule;
mod workflow;

pub use schedule::{topo_order, GraphIndex};
pub use workflow::{Edge, Node, NodeKind, WorkflowDef};
