//! Execution Records and the Persistence Port
//!
//! One row per execution, updated in place as the engine advances.
//! Observers poll snapshots; every update is write-through, so a reader
//! may see any prefix of the writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::Result;

/// Execution lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Persisted state of a single workflow execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub owner: Uuid,
    pub status: ExecutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_node: Option<String>,
    /// Node id → result. Append-only within one execution; the
    /// `ai_report` / `ai_report_error` keys are added by the aggregator.
    pub results: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExecutionRecord {
    fn new(workflow_id: Uuid, owner: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            owner,
            status: ExecutionStatus::Pending,
            current_node: None,
            results: Map::new(),
            error: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Write-through port for execution-status rows.
///
/// Shared across executions; implementations handle concurrent writers.
/// All updates are idempotent with respect to observers.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Create the record in `pending` and return its id
    async fn create_pending(&self, workflow_id: Uuid, owner: Uuid) -> Result<Uuid>;

    /// Update status (and, while running, the node being processed)
    async fn update_status(
        &self,
        execution_id: Uuid,
        status: ExecutionStatus,
        current_node: Option<String>,
    ) -> Result<()>;

    /// Merge one result key into the record
    async fn patch_result(&self, execution_id: Uuid, node_id: &str, result: Value) -> Result<()>;

    /// Terminal transition: status + completed_at + optional error
    async fn mark_terminal(
        &self,
        execution_id: Uuid,
        status: ExecutionStatus,
        error: Option<String>,
    ) -> Result<()>;

    /// Snapshot of the record; safe to call at any time
    async fn get(&self, execution_id: Uuid) -> Option<ExecutionRecord>;
}

/// DashMap-backed store, the crate's default implementation
#[derive(Default)]
pub struct InMemoryExecutionStore {
    records: DashMap<Uuid, ExecutionRecord>,
}

impl InMemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(record: &mut ExecutionRecord) {
        record.updated_at = Utc::now();
    }
}

#[async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn create_pending(&self, workflow_id: Uuid, owner: Uuid) -> Result<Uuid> {
        let record = ExecutionRecord::new(workflow_id, owner);
        let id = record.id;
        self.records.insert(id, record);
        Ok(id)
    }

    async fn update_status(
        &self,
        execution_id: Uuid,
        status: ExecutionStatus,
        current_node: Option<String>,
    ) -> Result<()> {
        if let Some(mut record) = self.records.get_mut(&execution_id) {
            record.status = status;
            if status == ExecutionStatus::Running && record.started_at.is_none() {
                record.started_at = Some(Utc::now());
            }
            if current_node.is_some() {
                record.current_node = current_node;
            }
            Self::touch(&mut record);
        }
        Ok(())
    }

    async fn patch_result(&self, execution_id: Uuid, node_id: &str, result: Value) -> Result<()> {
        if let Some(mut record) = self.records.get_mut(&execution_id) {
            record.results.insert(node_id.to_string(), result);
            Self::touch(&mut record);
        }
        Ok(())
    }

    async fn mark_terminal(
        &self,
        execution_id: Uuid,
        status: ExecutionStatus,
        error: Option<String>,
    ) -> Result<()> {
        if let Some(mut record) = self.records.get_mut(&execution_id) {
            record.status = status;
            record.completed_at = Some(Utc::now());
            record.current_node = None;
            if error.is_some() {
                record.error = error;
            }
            Self::touch(&mut record);
        }
        Ok(())
    }

    async fn get(&self, execution_id: Uuid) -> Option<ExecutionRecord> {
        self.records.get(&execution_id).map(|r| r.clone())
    }
}
