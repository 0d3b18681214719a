//! External Tool Adapter
//!
//! Uniform contract for shelling out to scanner binaries. When a binary
//! is not discoverable on PATH the adapter returns a fabricated payload
//! (marked `[MOCK]`) after a short simulated delay, so demo pipelines
//! stay observable on machines without the tools installed. Handlers
//! never branch on mock vs real; the marker in the output blob is the
//! only disclosure.
//!
//! Several scanners signal "findings present" through non-zero exit
//! codes (wpscan 2-4, gitleaks 1). Those codes are part of each tool's
//! documented success set; anything outside it is `ToolInvocationFailed`.

mod mock;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{Result, StrixError};
use crate::util::{MOCK_TOOL_DELAY, TOOL_TIMEOUT};

/// Static description of one scanner tool
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    /// Label reported in results (`scanner` field)
    pub scanner: &'static str,
    /// Binary probed on PATH
    pub bin: &'static str,
    /// Exit codes treated as success
    pub success_codes: &'static [i32],
}

pub const NMAP: ToolSpec = ToolSpec { scanner: "nmap", bin: "nmap", success_codes: &[0] };
pub const NIKTO: ToolSpec = ToolSpec { scanner: "nikto", bin: "nikto", success_codes: &[0] };
pub const GOBUSTER: ToolSpec = ToolSpec { scanner: "gobuster", bin: "gobuster", success_codes: &[0] };
pub const SQLMAP: ToolSpec = ToolSpec { scanner: "sqlmap", bin: "sqlmap", success_codes: &[0] };
/// wpscan: 0 clean, 2-4 are "scan ran, vulnerabilities found" variants
pub const WPSCAN: ToolSpec = ToolSpec { scanner: "wpscan", bin: "wpscan", success_codes: &[0, 2, 3, 4] };
/// gitleaks exits 1 when leaks are found
pub const GITLEAKS: ToolSpec = ToolSpec { scanner: "gitleaks", bin: "gitleaks", success_codes: &[0, 1] };
pub const TRIVY_SCA: ToolSpec = ToolSpec { scanner: "trivy-sca", bin: "trivy", success_codes: &[0] };
pub const SEMGREP: ToolSpec = ToolSpec { scanner: "semgrep", bin: "semgrep", success_codes: &[0] };
pub const TRIVY_IMAGE: ToolSpec = ToolSpec { scanner: "trivy-image", bin: "trivy", success_codes: &[0] };
pub const KUBE_BENCH: ToolSpec = ToolSpec { scanner: "kube-bench", bin: "kube-bench", success_codes: &[0] };
pub const TRIVY_IAC: ToolSpec = ToolSpec { scanner: "trivy-iac", bin: "trivy", success_codes: &[0] };
pub const INFRACOST: ToolSpec = ToolSpec { scanner: "infracost", bin: "infracost", success_codes: &[0] };

/// Low-level tool execution contract
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Whether the binary is discoverable on PATH
    fn exists(&self, tool: &str) -> bool;

    /// Run the tool, capturing combined stdout+stderr and the exit code
    async fn run(&self, tool: &str, args: &[String]) -> Result<(String, i32)>;
}

/// PATH probe + subprocess execution via tokio
pub struct SystemTools;

impl SystemTools {
    fn find_on_path(tool: &str) -> bool {
        let Some(path) = std::env::var_os("PATH") else {
            return false;
        };
        std::env::split_paths(&path).any(|dir| is_executable(&dir.join(tool)))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[async_trait]
impl ToolRunner for SystemTools {
    fn exists(&self, tool: &str) -> bool {
        Self::find_on_path(tool)
    }

    async fn run(&self, tool: &str, args: &[String]) -> Result<(String, i32)> {
        let output = tokio::time::timeout(
            TOOL_TIMEOUT,
            tokio::process::Command::new(tool).args(args).output(),
        )
        .await
        .map_err(|_| StrixError::ToolSpawn {
            tool: tool.to_string(),
            reason: format!("timed out after {}s", TOOL_TIMEOUT.as_secs()),
        })?
        .map_err(|e| StrixError::ToolSpawn {
            tool: tool.to_string(),
            reason: e.to_string(),
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let code = output.status.code().unwrap_or(-1);
        Ok((combined, code))
    }
}

/// Adapter handlers talk to: real execution with mock fallback
#[derive(Clone)]
pub struct ToolAdapter {
    runner: Arc<dyn ToolRunner>,
    mock_delay: Duration,
}

impl ToolAdapter {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            runner,
            mock_delay: MOCK_TOOL_DELAY,
        }
    }

    /// Adapter backed by the system PATH
    pub fn system() -> Self {
        Self::new(Arc::new(SystemTools))
    }

    /// Override the simulated mock delay (tests use zero)
    pub fn with_mock_delay(mut self, delay: Duration) -> Self {
        self.mock_delay = delay;
        self
    }

    /// Invoke a tool against a target, falling back to a mock payload
    /// when the binary is absent.
    pub async fn invoke(&self, spec: &ToolSpec, args: &[String], target: &str) -> Result<String> {
        if !self.runner.exists(spec.bin) {
            debug!(tool = spec.bin, target, "binary not on PATH, returning mock payload");
            tokio::time::sleep(self.mock_delay).await;
            return Ok(mock::payload(spec.scanner, target));
        }

        debug!(tool = spec.bin, ?args, "running scanner");
        let (output, code) = self.runner.run(spec.bin, args).await?;

        if spec.success_codes.contains(&code) {
            Ok(output)
        } else {
            warn!(tool = spec.bin, code, "scanner exited outside its success set");
            Err(StrixError::ToolInvocationFailed {
                tool: spec.scanner.to_string(),
                code,
                output,
            })
        }
    }
}
