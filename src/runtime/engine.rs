//! Execution Controller
//!
//! `enqueue` persists a pending record and returns immediately; the
//! execution itself runs on its own tokio task. Within one execution,
//! nodes run sequentially in topological order and every result is
//! written through to the persistence port, so observers polling the
//! record see results materialize in order, with `current_node` naming
//! the node being processed.
//!
//! The task is the sole mutator of its execution record. There is no
//! cancellation: closing the process kills in-flight executions, and
//! stuck `running` rows are a janitor's problem, not the engine's.

use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::ai::AiAdapter;
use crate::error::Result;
use crate::event::{EventKind, EventLog};
use crate::graph::{topo_order, GraphIndex, WorkflowDef};
use crate::store::{ExecutionRecord, ExecutionStatus, ExecutionStore, NodeResult, ResultStore};

use super::gate::{skip_reason, NodeState};
use super::handlers::{HandlerContext, HandlerRegistry};
use super::report::{completed_scan_summaries, ExecutiveReport};

/// The workflow execution engine
pub struct Engine {
    registry: Arc<HandlerRegistry>,
    store: Arc<dyn ExecutionStore>,
    ai: AiAdapter,
    events: EventLog,
}

impl Engine {
    /// Engine with the builtin handler set over the given collaborators
    pub fn new(ctx: HandlerContext, store: Arc<dyn ExecutionStore>) -> Self {
        let ai = ctx.ai.clone();
        let registry = Arc::new(HandlerRegistry::builtin(Arc::new(ctx)));
        Self {
            registry,
            store,
            ai,
            events: EventLog::new(),
        }
    }

    /// Use a shared event log (observers, tests)
    pub fn with_event_log(mut self, events: EventLog) -> Self {
        self.events = events;
        self
    }

    pub fn event_log(&self) -> &EventLog {
        &self.events
    }

    /// Start an execution. Synchronous from the caller's perspective:
    /// the pending record is created, the background task is spawned,
    /// and the execution id returns without waiting on any node.
    pub async fn enqueue(&self, def: WorkflowDef) -> Result<Uuid> {
        let execution_id = self.store.create_pending(def.id, def.owner).await?;

        let task = ExecutionTask {
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
            ai: self.ai.clone(),
            events: self.events.clone(),
        };
        tokio::spawn(async move {
            task.run(execution_id, def).await;
        });

        Ok(execution_id)
    }

    /// Snapshot of an execution record; safe to call at any time
    pub async fn status(&self, execution_id: Uuid) -> Option<ExecutionRecord> {
        self.store.get(execution_id).await
    }
}

/// Everything one background execution needs
struct ExecutionTask {
    registry: Arc<HandlerRegistry>,
    store: Arc<dyn ExecutionStore>,
    ai: AiAdapter,
    events: EventLog,
}

impl ExecutionTask {
    #[instrument(skip(self, def), fields(execution_id = %execution_id, workflow_id = %def.id))]
    async fn run(self, execution_id: Uuid, def: WorkflowDef) {
        info!(nodes = def.nodes.len(), "starting workflow execution");
        let started = Instant::now();

        let _ = self
            .store
            .update_status(execution_id, ExecutionStatus::Running, None)
            .await;
        self.events.emit(EventKind::ExecutionStarted {
            execution_id,
            node_count: def.nodes.len(),
        });

        // Parse + schedule; either failure aborts before any node runs
        let order = match def
            .validate_shape()
            .and_then(|()| topo_order(&def.nodes, &def.edges))
        {
            Ok(order) => order,
            Err(e) => {
                self.fail(execution_id, None, format!("Failed to schedule workflow: {e}"))
                    .await;
                return;
            }
        };
        debug!(?order, "execution order");

        let index = GraphIndex::build(&def.nodes, &def.edges);
        let results = ResultStore::new();
        let mut states: FxHashMap<Arc<str>, NodeState> = FxHashMap::default();

        for node_id in &order {
            let Some(node) = def.find_node(node_id) else {
                self.fail(
                    execution_id,
                    Some(Arc::clone(node_id)),
                    format!("Node not found: {node_id}"),
                )
                .await;
                return;
            };

            let _ = self
                .store
                .update_status(
                    execution_id,
                    ExecutionStatus::Running,
                    Some(node_id.to_string()),
                )
                .await;

            // Gate check before dispatch
            if let Some(reason) = skip_reason(node_id, &index, &states, &results) {
                info!(node_id = %node_id, %reason, "skipping node");
                self.events.emit(EventKind::NodeSkipped {
                    execution_id,
                    node_id: Arc::clone(node_id),
                    reason: reason.clone(),
                });
                states.insert(Arc::clone(node_id), NodeState::Skipped);
                let result = NodeResult::skipped(reason);
                let _ = self
                    .store
                    .patch_result(execution_id, node_id, result.to_value())
                    .await;
                results.insert(Arc::clone(node_id), result);
                continue;
            }

            info!(node_id = %node_id, kind = %node.kind, "executing node");
            self.events.emit(EventKind::NodeStarted {
                execution_id,
                node_id: Arc::clone(node_id),
                kind: node.kind.to_string(),
            });

            let node_start = Instant::now();
            let outcome = match self.registry.get(&node.kind) {
                Some(handler) => handler.handle(node, &results, def.owner).await,
                None => Err(crate::error::StrixError::UnknownNodeType {
                    node_id: node.id.clone(),
                    node_type: node.kind.to_string(),
                }),
            };
            let duration_ms = node_start.elapsed().as_millis() as u64;

            match outcome {
                Ok(result) => {
                    states.insert(Arc::clone(node_id), NodeState::Completed);
                    let _ = self
                        .store
                        .patch_result(execution_id, node_id, result.to_value())
                        .await;
                    results.insert(Arc::clone(node_id), result);
                    self.events.emit(EventKind::NodeCompleted {
                        execution_id,
                        node_id: Arc::clone(node_id),
                        duration_ms,
                    });
                }
                Err(e) => {
                    error!(node_id = %node_id, error = %e, "node failed");
                    states.insert(Arc::clone(node_id), NodeState::Failed);
                    let result = NodeResult::failed(e.to_string());
                    let _ = self
                        .store
                        .patch_result(execution_id, node_id, result.to_value())
                        .await;
                    results.insert(Arc::clone(node_id), result);
                    self.events.emit(EventKind::NodeFailed {
                        execution_id,
                        node_id: Arc::clone(node_id),
                        error: e.to_string(),
                        duration_ms,
                    });
                    self.fail(
                        execution_id,
                        Some(Arc::clone(node_id)),
                        format!("Node {node_id} failed: {e}"),
                    )
                    .await;
                    return;
                }
            }
        }

        // Executive report over completed nodes only
        let completed: Vec<_> = results
            .iter_ordered()
            .into_iter()
            .filter(|(id, _)| states.get(id.as_ref()) == Some(&NodeState::Completed))
            .collect();
        let summaries = completed_scan_summaries(&completed);

        if !summaries.is_empty() {
            info!("generating executive security report");
            match self.ai.generate_security_recommendations(&summaries).await {
                Ok(text) => {
                    let report = ExecutiveReport::build(text, &completed);
                    let value = serde_json::to_value(&report).unwrap_or(Value::Null);
                    let _ = self.store.patch_result(execution_id, "ai_report", value).await;
                    self.events.emit(EventKind::ReportGenerated { execution_id });
                }
                Err(e) => {
                    // Report failures never fail the execution
                    warn!(error = %e, "failed to generate executive report");
                    let _ = self
                        .store
                        .patch_result(execution_id, "ai_report_error", Value::String(e.to_string()))
                        .await;
                    self.events.emit(EventKind::ReportFailed {
                        execution_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        let _ = self
            .store
            .mark_terminal(execution_id, ExecutionStatus::Completed, None)
            .await;
        let duration_ms = started.elapsed().as_millis() as u64;
        self.events.emit(EventKind::ExecutionCompleted {
            execution_id,
            duration_ms,
        });
        info!(duration_ms, "workflow execution completed");
    }

    async fn fail(&self, execution_id: Uuid, failed_node: Option<Arc<str>>, message: String) {
        error!(error = %message, "workflow execution failed");
        self.events.emit(EventKind::ExecutionFailed {
            execution_id,
            error: message.clone(),
            failed_node,
        });
        let _ = self
            .store
            .mark_terminal(execution_id, ExecutionStatus::Failed, Some(message))
            .await;
    }
}
