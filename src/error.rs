//! Strix Error Types with Error Codes
//!
//! Error code ranges:
//! - STRX-000-009: Workflow definition errors
//! - STRX-020-029: Graph/scheduling errors
//! - STRX-030-039: Node execution errors
//! - STRX-040-049: Tool adapter errors
//! - STRX-050-059: AI provider errors
//! - STRX-060-069: Auto-fix errors
//! - STRX-070-079: Collaborator errors
//! - STRX-090-099: IO/serialization errors

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StrixError>;

#[derive(Error, Debug, Diagnostic)]
pub enum StrixError {
    // ═══════════════════════════════════════════
    // WORKFLOW DEFINITION ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[STRX-001] Malformed workflow: {details}")]
    #[diagnostic(
        code(strix::malformed_workflow),
        help("Every node needs a non-empty id and a type; edges must reference declared nodes")
    )]
    MalformedWorkflow { details: String },

    // ═══════════════════════════════════════════
    // GRAPH / SCHEDULING ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[STRX-020] Workflow contains a cycle: {cycle}")]
    #[diagnostic(
        code(strix::cyclic_workflow),
        help("Remove circular edges; execution requires a DAG")
    )]
    CyclicWorkflow { cycle: String },

    // ═══════════════════════════════════════════
    // NODE EXECUTION ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[STRX-030] Unknown node type '{node_type}' on node '{node_id}'")]
    #[diagnostic(code(strix::unknown_node_type))]
    UnknownNodeType { node_id: String, node_type: String },

    #[error("[STRX-031] No target found for {scanner} (node '{node_id}')")]
    #[diagnostic(
        code(strix::no_target),
        help("Scanner nodes need an upstream trigger that supplies a target")
    )]
    NoTarget { node_id: String, scanner: String },

    #[error("[STRX-032] Node '{node_id}' misconfigured: {reason}")]
    NodeConfig { node_id: String, reason: String },

    // ═══════════════════════════════════════════
    // TOOL ADAPTER ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[STRX-040] {tool} invocation failed (exit code {code}): {output}")]
    #[diagnostic(code(strix::tool_invocation_failed))]
    ToolInvocationFailed {
        tool: String,
        code: i32,
        output: String,
    },

    #[error("[STRX-041] Failed to spawn {tool}: {reason}")]
    ToolSpawn { tool: String, reason: String },

    // ═══════════════════════════════════════════
    // AI PROVIDER ERRORS (050-059)
    // ═══════════════════════════════════════════
    #[error("[STRX-050] No AI provider configured")]
    #[diagnostic(
        code(strix::no_provider),
        help("Set GEMINI_API_KEY or GROQ_API_KEY")
    )]
    NoProviderConfigured,

    #[error("[STRX-051] AI provider error: {message}")]
    ProviderApi { message: String },

    // ═══════════════════════════════════════════
    // AUTO-FIX ERRORS (060-069)
    // ═══════════════════════════════════════════
    #[error("[STRX-060] Missing access token for owner '{owner}'")]
    #[diagnostic(
        code(strix::missing_credential),
        help("Connect the owner's source-control account before running this node")
    )]
    MissingCredential { owner: String },

    #[error("[STRX-061] Auto-fix context incomplete: {details}")]
    #[diagnostic(code(strix::missing_context))]
    MissingContext { details: String },

    #[error("[STRX-062] Could not infer a file path from prior scanner results")]
    #[diagnostic(
        code(strix::no_path_inferable),
        help("Set data.path on the auto-fix node or run a scanner that reports file paths")
    )]
    NoPathInferable,

    // ═══════════════════════════════════════════
    // COLLABORATOR ERRORS (070-079)
    // ═══════════════════════════════════════════
    #[error("[STRX-070] Source-control call failed: {reason}")]
    SourceControl { reason: String },

    #[error("[STRX-071] Notification delivery failed: {reason}")]
    Notify { reason: String },

    #[error("[STRX-072] Owner '{owner}' not found")]
    UnknownOwner { owner: String },

    // ═══════════════════════════════════════════
    // IO / SERIALIZATION ERRORS (090-099)
    // ═══════════════════════════════════════════
    #[error("[STRX-093] IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("[STRX-094] JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("[STRX-095] HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl StrixError {
    /// Get the stable error code (e.g., "STRX-001")
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedWorkflow { .. } => "STRX-001",
            Self::CyclicWorkflow { .. } => "STRX-020",
            Self::UnknownNodeType { .. } => "STRX-030",
            Self::NoTarget { .. } => "STRX-031",
            Self::NodeConfig { .. } => "STRX-032",
            Self::ToolInvocationFailed { .. } => "STRX-040",
            Self::ToolSpawn { .. } => "STRX-041",
            Self::NoProviderConfigured => "STRX-050",
            Self::ProviderApi { .. } => "STRX-051",
            Self::MissingCredential { .. } => "STRX-060",
            Self::MissingContext { .. } => "STRX-061",
            Self::NoPathInferable => "STRX-062",
            Self::SourceControl { .. } => "STRX-070",
            Self::Notify { .. } => "STRX-071",
            Self::UnknownOwner { .. } => "STRX-072",
            Self::Io(_) => "STRX-093",
            Self::Json(_) => "STRX-094",
            Self::Http(_) => "STRX-095",
        }
    }

    /// Whether the error aborts an execution before any node runs
    pub fn is_pre_execution(&self) -> bool {
        matches!(
            self,
            Self::MalformedWorkflow { .. } | Self::CyclicWorkflow { .. }
        )
    }
}
