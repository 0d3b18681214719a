//! State management: node results and execution records

mod executions;
mod results;

pub use executions::{
    ExecutionRecord, ExecutionStatus, ExecutionStore, InMemoryExecutionStore,
};
pub use results::{
    AutoFixResult, DecisionResult, DocumentResult, NodeResult, NotificationResult, ResultStore,
    ScanResult, TriggerResult,
};
