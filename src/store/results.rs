//! Node Results - tagged variants over the per-node outcome shapes
//!
//! Results were historically free-form mappings; the tagged enum keeps
//! the persisted JSON shape (conventional keys: `scanner`, `status`,
//! `target`, `output`, `data`, `decision_result`, `pr_url`, ...) while
//! giving handlers typed accessors instead of pervasive downcasts.
//!
//! The `ResultStore` is written only by the execution engine, in
//! topological order; handlers get a read-only reference. Target
//! propagation walks insertion order, which makes "first non-empty
//! `target` wins" deterministic.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Outcome of a trigger node: supplies the pipeline target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerResult {
    #[serde(rename = "type")]
    kind: &'static str,
    pub target: String,
    pub status: &'static str,
}

impl TriggerResult {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            kind: "trigger",
            target: target.into(),
            status: "completed",
        }
    }
}

/// Outcome of a scanner-family node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub scanner: String,
    pub target: String,
    pub output: String,
    /// Structured findings, when the scanner produced them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub status: &'static str,
}

impl ScanResult {
    pub fn completed(scanner: impl Into<String>, target: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            scanner: scanner.into(),
            target: target.into(),
            output: output.into(),
            data: None,
            status: "completed",
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Outcome of a decision node: gates downstream execution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionResult {
    #[serde(rename = "type")]
    kind: &'static str,
    pub decision_result: bool,
    pub actual_value: f64,
    pub status: &'static str,
}

impl DecisionResult {
    pub fn new(decision_result: bool, actual_value: f64) -> Self {
        Self {
            kind: "decision",
            decision_result,
            actual_value,
            status: "completed",
        }
    }
}

/// Outcome of a publishing terminal (email, slack, github-issue)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationResult {
    #[serde(rename = "type")]
    pub channel: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

impl NotificationResult {
    pub fn sent(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            status: "sent",
            error: None,
            issue_url: None,
            issue_id: None,
            repository: None,
        }
    }

    /// Delivery failure: recorded on the node, does not fail the execution
    pub fn failed(channel: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            status: "failed",
            error: Some(error.into()),
            issue_url: None,
            issue_id: None,
            repository: None,
        }
    }

    pub fn issue_created(url: impl Into<String>, id: u64, repository: impl Into<String>) -> Self {
        Self {
            channel: "github-issue".to_string(),
            status: "created",
            error: None,
            issue_url: Some(url.into()),
            issue_id: Some(id),
            repository: Some(repository.into()),
        }
    }
}

/// Outcome of the auto-fix procedure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoFixResult {
    #[serde(rename = "type")]
    kind: &'static str,
    pub pr_url: String,
    pub pr_number: u64,
    pub branch: String,
    pub status: &'static str,
    pub output: String,
}

impl AutoFixResult {
    pub fn created(pr_url: impl Into<String>, pr_number: u64, branch: impl Into<String>) -> Self {
        let pr_url = pr_url.into();
        let output = format!("Auto-Fix PR Created: {pr_url}");
        Self {
            kind: "auto-fix",
            pr_url,
            pr_number,
            branch: branch.into(),
            status: "created",
            output,
        }
    }
}

/// Outcome of document-producing nodes (flow-chart, policy-check,
/// generate-iac, drift-check, generate-docs, estimate-cost)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentResult {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift_detected: Option<bool>,
    /// Set by estimate-cost so `cost` decisions can resolve the variable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_cost: Option<String>,
}

impl DocumentResult {
    pub fn completed(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            status: "completed",
            target: None,
            output: None,
            files: None,
            changes: None,
            passed: None,
            violations: None,
            drift_detected: None,
            monthly_cost: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn with_changes(mut self, changes: Value) -> Self {
        self.changes = Some(changes);
        self
    }
}

/// Per-node outcome. Serializes to the conventional open-mapping shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeResult {
    Trigger(TriggerResult),
    Scan(ScanResult),
    Decision(DecisionResult),
    Notification(NotificationResult),
    AutoFix(AutoFixResult),
    Document(DocumentResult),
    /// Node not executed because a predecessor failed, was skipped, or a
    /// decision gated it off. A first-class outcome, never an error.
    Skipped { status: &'static str, reason: String },
    /// The node whose handler error failed the execution
    Failed { status: &'static str, error: String },
}

impl NodeResult {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            status: "skipped",
            reason: reason.into(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            status: "failed",
            error: error.into(),
        }
    }

    pub fn status(&self) -> &str {
        match self {
            Self::Trigger(r) => r.status,
            Self::Scan(r) => r.status,
            Self::Decision(r) => r.status,
            Self::Notification(r) => r.status,
            Self::AutoFix(r) => r.status,
            Self::Document(r) => r.status,
            Self::Skipped { status, .. } | Self::Failed { status, .. } => status,
        }
    }

    /// The scan subject this result carries, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Trigger(r) => Some(r.target.as_str()),
            Self::Scan(r) => Some(r.target.as_str()),
            Self::Document(r) => r.target.as_deref(),
            _ => None,
        }
    }

    /// Raw tool/AI output text, if any
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Scan(r) => Some(r.output.as_str()),
            Self::AutoFix(r) => Some(r.output.as_str()),
            Self::Document(r) => r.output.as_deref(),
            _ => None,
        }
    }

    /// Structured findings, if any
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Scan(r) => r.data.as_ref(),
            _ => None,
        }
    }

    /// Handler kind label for report lines: scanner name or type tag
    pub fn label(&self) -> &str {
        match self {
            Self::Trigger(_) => "trigger",
            Self::Scan(r) => r.scanner.as_str(),
            Self::Decision(_) => "decision",
            Self::Notification(r) => r.channel.as_str(),
            Self::AutoFix(_) => "auto-fix",
            Self::Document(r) => r.kind.as_str(),
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }

    /// Monthly cost string, for `cost` decision rules
    pub fn monthly_cost(&self) -> Option<&str> {
        match self {
            Self::Document(r) => r.monthly_cost.as_deref(),
            _ => None,
        }
    }

    /// True when this is a decision result that gated its successors off
    pub fn gated_off(&self) -> bool {
        matches!(self, Self::Decision(d) if !d.decision_result)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Default)]
struct Inner {
    order: Vec<Arc<str>>,
    map: FxHashMap<Arc<str>, NodeResult>,
}

/// Insertion-ordered result storage for one execution.
///
/// The engine inserts in topological order; iteration and target
/// propagation follow that order.
#[derive(Clone, Default)]
pub struct ResultStore {
    inner: Arc<RwLock<Inner>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a result. Written only by the execution engine.
    pub fn insert(&self, node_id: Arc<str>, result: NodeResult) {
        let mut inner = self.inner.write();
        if !inner.map.contains_key(&node_id) {
            inner.order.push(Arc::clone(&node_id));
        }
        inner.map.insert(node_id, result);
    }

    pub fn get(&self, node_id: &str) -> Option<NodeResult> {
        self.inner.read().map.get(node_id).cloned()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.inner.read().map.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First non-empty `target` in insertion (= topological) order.
    ///
    /// With a single upstream trigger this deterministically returns the
    /// trigger's URL; callers must not depend on any later override.
    pub fn get_target(&self) -> Option<String> {
        let inner = self.inner.read();
        for id in &inner.order {
            if let Some(target) = inner.map.get(id).and_then(|r| r.target()) {
                if !target.is_empty() {
                    return Some(target.to_string());
                }
            }
        }
        None
    }

    /// Snapshot of all results in insertion order
    pub fn iter_ordered(&self) -> Vec<(Arc<str>, NodeResult)> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.map.get(id).map(|r| (Arc::clone(id), r.clone())))
            .collect()
    }

    /// JSON snapshot keyed by node id
    pub fn to_json(&self) -> Map<String, Value> {
        self.iter_ordered()
            .into_iter()
            .map(|(id, r)| (id.to_string(), r.to_value()))
            .collect()
    }
}
