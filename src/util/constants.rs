//! Centralized constants for strix runtime configuration
//!
//! All timeout and limit values in one place for easy tuning.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════
// Execution Timeouts
// ═══════════════════════════════════════════════════════════════

/// Timeout for a single scanner tool subprocess
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout for LLM inference calls
pub const INFER_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for source-control / notification HTTP requests
pub const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for establishing HTTP connections
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ═══════════════════════════════════════════════════════════════
// Mock Mode
// ═══════════════════════════════════════════════════════════════

/// Simulated work delay when a scanner binary is absent and a mock
/// payload is returned instead
pub const MOCK_TOOL_DELAY: Duration = Duration::from_secs(2);

// ═══════════════════════════════════════════════════════════════
// Aggregation Limits
// ═══════════════════════════════════════════════════════════════

/// Per-node output truncation when assembling AI prompt context
pub const PROMPT_OUTPUT_LIMIT: usize = 2000;

/// Fallback target when a trigger omits `sourceUrl`
pub const DEFAULT_TARGET: &str = "example.com";
