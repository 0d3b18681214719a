//! Execution runtime: engine loop, handler dispatch, gating, reporting

mod autofix;
mod engine;
mod gate;
mod handlers;
mod report;

pub use engine::Engine;
pub use gate::{skip_reason, NodeState};
pub use handlers::{evaluate_decision, HandlerContext, HandlerRegistry, NodeHandler};
pub use report::ExecutiveReport;
