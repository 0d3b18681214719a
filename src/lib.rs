//! Strix - DAG workflow engine for security-analysis pipelines
//!
//! A workflow is a DAG of typed nodes: a trigger supplies the target,
//! scanner nodes invoke external tools, decision nodes gate downstream
//! execution, and publishing terminals deliver results. The engine
//! schedules the graph topologically, dispatches each node to its
//! handler on a background task, and writes every result through to a
//! persisted execution record that observers can poll.
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  graph/     stored JSON → WorkflowDef, Node, Edge, schedule  │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  runtime/   Engine loop, HandlerRegistry, gate, report       │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  store/     NodeResult, ResultStore, ExecutionStore          │
//! │  scanner/   external tool adapter with mock fallback         │
//! │  ai/        provider chain (Gemini → Groq) + prompt ops      │
//! │  collab/    source control, notifications, user store        │
//! │  event/     append-only execution audit trail                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`graph`] | Definition parsing, shape validation, topological order |
//! | [`runtime`] | Execution engine, handler dispatch, skip/gate rules |
//! | [`store`] | Typed node results + execution record persistence port |
//! | [`scanner`] | Subprocess scanners with mock-when-absent fallback |
//! | [`ai`] | LLM provider fallback chain and prompt operations |
//! | [`collab`] | Source-control / notification / user collaborators |
//! | [`event`] | Audit events with monotonic ordering |
//! | [`error`] | Error types with stable STRX codes |

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL
// ═══════════════════════════════════════════════════════════════
pub mod graph;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER
// ═══════════════════════════════════════════════════════════════
pub mod runtime;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER
// ═══════════════════════════════════════════════════════════════
pub mod ai;
pub mod collab;
pub mod event;
pub mod scanner;
pub mod store;
pub mod util;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING
// ═══════════════════════════════════════════════════════════════
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

pub use error::{Result, StrixError};

pub use graph::{topo_order, Edge, GraphIndex, Node, NodeKind, WorkflowDef};

pub use runtime::{
    evaluate_decision, skip_reason, Engine, ExecutiveReport, HandlerContext, HandlerRegistry,
    NodeHandler, NodeState,
};

pub use store::{
    AutoFixResult, DecisionResult, DocumentResult, ExecutionRecord, ExecutionStatus,
    ExecutionStore, InMemoryExecutionStore, NodeResult, NotificationResult, ResultStore,
    ScanResult, TriggerResult,
};

pub use scanner::{SystemTools, ToolAdapter, ToolRunner, ToolSpec};

pub use ai::{AiAdapter, GeminiProvider, GroqProvider, MockProvider, Provider};

pub use collab::{
    parse_github_target, GitHubClient, InMemoryUserStore, IssueInfo, Notifier, Owner,
    PullRequestInfo, SourceControl, UserStore, WebhookNotifier,
};

pub use event::{Event, EventKind, EventLog};
