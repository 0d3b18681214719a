//! Workflow Definition Types
//!
//! The stored form of a workflow is two JSON arrays (nodes, edges) plus
//! identity fields. Parsing is purely structural: semantic checks (cycle
//! detection, gating) live in the scheduler and the engine.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Result, StrixError};

/// Closed set of node type tags.
///
/// Unrecognized tags parse into `Unknown` so a bad tag fails the
/// execution *at that node* rather than rejecting the whole definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Trigger,
    Nmap,
    Nikto,
    Gobuster,
    Sqlmap,
    Wpscan,
    OwaspVulnerabilities,
    SecretScan,
    DependencyCheck,
    SemgrepScan,
    ContainerScan,
    KubeBench,
    IacScan,
    FlowChart,
    AutoFix,
    Email,
    GithubIssue,
    Slack,
    Decision,
    EstimateCost,
    PolicyCheck,
    GenerateIac,
    DriftCheck,
    GenerateDocs,
    Unknown(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Trigger => "trigger",
            Self::Nmap => "nmap",
            Self::Nikto => "nikto",
            Self::Gobuster => "gobuster",
            Self::Sqlmap => "sqlmap",
            Self::Wpscan => "wpscan",
            Self::OwaspVulnerabilities => "owasp-vulnerabilities",
            Self::SecretScan => "secret-scan",
            Self::DependencyCheck => "dependency-check",
            Self::SemgrepScan => "semgrep-scan",
            Self::ContainerScan => "container-scan",
            Self::KubeBench => "kube-bench",
            Self::IacScan => "iac-scan",
            Self::FlowChart => "flow-chart",
            Self::AutoFix => "auto-fix",
            Self::Email => "email",
            Self::GithubIssue => "github-issue",
            Self::Slack => "slack",
            Self::Decision => "decision",
            Self::EstimateCost => "estimate-cost",
            Self::PolicyCheck => "policy-check",
            Self::GenerateIac => "generate-iac",
            Self::DriftCheck => "drift-check",
            Self::GenerateDocs => "generate-docs",
            Self::Unknown(s) => s,
        }
    }
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "trigger" => Self::Trigger,
            "nmap" => Self::Nmap,
            "nikto" => Self::Nikto,
            "gobuster" => Self::Gobuster,
            "sqlmap" => Self::Sqlmap,
            "wpscan" => Self::Wpscan,
            "owasp-vulnerabilities" => Self::OwaspVulnerabilities,
            "secret-scan" => Self::SecretScan,
            "dependency-check" => Self::DependencyCheck,
            "semgrep-scan" => Self::SemgrepScan,
            "container-scan" => Self::ContainerScan,
            "kube-bench" => Self::KubeBench,
            "iac-scan" => Self::IacScan,
            "flow-chart" => Self::FlowChart,
            "auto-fix" => Self::AutoFix,
            "email" => Self::Email,
            "github-issue" => Self::GithubIssue,
            "slack" => Self::Slack,
            "decision" => Self::Decision,
            "estimate-cost" => Self::EstimateCost,
            "policy-check" => Self::PolicyCheck,
            "generate-iac" => Self::GenerateIac,
            "drift-check" => Self::DriftCheck,
            "generate-docs" => Self::GenerateDocs,
            _ => Self::Unknown(s),
        }
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed unit of work in the workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Free-form handler configuration (target override, ports, recipient, repository, ...)
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            data: Map::new(),
        }
    }

    pub fn with_data(mut self, key: &str, value: Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }

    /// String field from `data`, treating empty strings as absent
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// String field from `data.config`, the shape the canvas frontend stores
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.data
            .get("config")
            .and_then(Value::as_object)
            .and_then(|c| c.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// A directed edge between two declared nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// A stored workflow definition, immutable during execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDef {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    pub owner: Uuid,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl WorkflowDef {
    pub fn new(owner: Uuid, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            owner,
            nodes,
            edges,
        }
    }

    /// Parse a stored definition from JSON
    pub fn parse(value: Value) -> Result<Self> {
        let def: WorkflowDef =
            serde_json::from_value(value).map_err(|e| StrixError::MalformedWorkflow {
                details: e.to_string(),
            })?;
        def.validate_shape()?;
        Ok(def)
    }

    /// Structural validation: non-empty unique node ids, edges reference
    /// declared nodes. No semantic checks here.
    pub fn validate_shape(&self) -> Result<()> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for node in &self.nodes {
            if node.id.is_empty() {
                return Err(StrixError::MalformedWorkflow {
                    details: "node with empty id".to_string(),
                });
            }
            if !seen.insert(node.id.as_str()) {
                return Err(StrixError::MalformedWorkflow {
                    details: format!("duplicate node id '{}'", node.id),
                });
            }
        }
        for edge in &self.edges {
            if !seen.contains(edge.source.as_str()) {
                return Err(StrixError::MalformedWorkflow {
                    details: format!("edge references unknown node '{}'", edge.source),
                });
            }
            if !seen.contains(edge.target.as_str()) {
                return Err(StrixError::MalformedWorkflow {
                    details: format!("edge references unknown node '{}'", edge.target),
                });
            }
        }
        Ok(())
    }

    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
