//! Auto-Fix Handler
//!
//! A micro-protocol over the source-control collaborator: resolve the
//! repository context, infer the vulnerable file, have the AI produce a
//! fixed body, then branch + commit + open a pull request for review.
//! Any collaborator failure fails the node (and skips cascade from
//! there).

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use tracing::info;
use uuid::Uuid;

use crate::collab::parse_github_target;
use crate::error::{Result, StrixError};
use crate::graph::Node;
use crate::store::{AutoFixResult, NodeResult, ResultStore};

use super::handlers::{HandlerContext, NodeHandler};

pub(crate) struct AutoFixHandler {
    pub(crate) ctx: Arc<HandlerContext>,
}

/// First `"file": "<p>"` or `"path": "<p>"` occurrence in prior outputs
fn infer_path(prior: &ResultStore) -> Option<String> {
    static FILE_RE: OnceLock<Regex> = OnceLock::new();
    static PATH_RE: OnceLock<Regex> = OnceLock::new();
    let file_re = FILE_RE.get_or_init(|| Regex::new(r#""file":\s*"([^"]+)""#).unwrap());
    let path_re = PATH_RE.get_or_init(|| Regex::new(r#""path":\s*"([^"]+)""#).unwrap());

    for (_, result) in prior.iter_ordered() {
        let Some(output) = result.output() else {
            continue;
        };
        for re in [file_re, path_re] {
            if let Some(captures) = re.captures(output) {
                return Some(captures[1].to_string());
            }
        }
    }
    None
}

/// Language hint for the analysis prompt, from the file extension
fn language_of(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("rs") => "rust",
        Some("go") => "go",
        Some("py") => "python",
        Some("js") => "javascript",
        Some("ts") => "typescript",
        Some("java") => "java",
        Some("rb") => "ruby",
        Some("php") => "php",
        _ => "code",
    }
}

#[async_trait]
impl NodeHandler for AutoFixHandler {
    async fn handle(&self, node: &Node, prior: &ResultStore, owner_id: Uuid) -> Result<NodeResult> {
        info!(node_id = %node.id, "running auto-fix");

        // 1. Authenticate
        let user = self.ctx.users.get_user(owner_id).await?;
        let token = user.access_token.ok_or_else(|| StrixError::MissingCredential {
            owner: owner_id.to_string(),
        })?;

        // 2. Resolve repository context
        let target = prior.get_target().unwrap_or_default();
        let parsed = parse_github_target(&target);
        let owner = node
            .data_str("owner")
            .map(str::to_string)
            .or_else(|| parsed.as_ref().map(|(o, _)| o.clone()));
        let repo = node
            .data_str("repo")
            .map(str::to_string)
            .or_else(|| parsed.as_ref().map(|(_, r)| r.clone()));
        let branch = node.data_str("branch").unwrap_or("main").to_string();

        let (Some(owner), Some(repo)) = (owner, repo) else {
            return Err(StrixError::MissingContext {
                details: format!("auto-fix requires owner and repo (target: {target})"),
            });
        };

        // Path from config, else inferred from prior scanner findings
        let path = match node.data_str("path") {
            Some(path) => path.to_string(),
            None => {
                info!(node_id = %node.id, "path not provided, searching prior scanner results");
                infer_path(prior).ok_or(StrixError::NoPathInferable)?
            }
        };

        // 3. Fetch file content
        info!(node_id = %node.id, %owner, %repo, %path, "reading file");
        let content = self
            .ctx
            .source_control
            .get_file_content(&token, &owner, &repo, &path)
            .await?;

        // 4. Identify the vulnerability
        let vulnerability = match node.data_str("vulnerability") {
            Some(v) => v.to_string(),
            None => {
                info!(node_id = %node.id, "analyzing code for vulnerabilities");
                let mut scanner_context = String::new();
                for (_, result) in prior.iter_ordered() {
                    if let Some(output) = result.output() {
                        scanner_context
                            .push_str(&format!("Scanner Output ({}):\n{output}\n\n", result.label()));
                    }
                }
                let input = if scanner_context.is_empty() {
                    content.clone()
                } else {
                    format!("SCANNER FINDINGS:\n{scanner_context}\nCODE TO FIX:\n{content}")
                };
                self.ctx.ai.analyze_code(&input, language_of(&path)).await?
            }
        };

        // 5. Generate the fixed file body
        info!(node_id = %node.id, "generating fix");
        let fixed = self.ctx.ai.generate_fix(&content, &vulnerability).await?;

        // 6. Branch off the base HEAD
        let fix_branch = format!("fix/vuln-{}", Utc::now().timestamp());
        info!(node_id = %node.id, branch = %fix_branch, "creating fix branch");
        let base_sha = self
            .ctx
            .source_control
            .get_reference(&token, &owner, &repo, &format!("heads/{branch}"))
            .await?;
        self.ctx
            .source_control
            .create_branch(&token, &owner, &repo, &fix_branch, &base_sha)
            .await?;

        // 7. Commit the fixed content
        let file_sha = self
            .ctx
            .source_control
            .get_file_sha(&token, &owner, &repo, &path, &fix_branch)
            .await?;
        self.ctx
            .source_control
            .update_file(
                &token,
                &owner,
                &repo,
                &path,
                &fixed,
                &file_sha,
                "fix: resolve security vulnerability",
                &fix_branch,
            )
            .await?;

        // 8. Open the pull request
        info!(node_id = %node.id, "opening pull request");
        let pr_title = format!("fix: resolve security vulnerability in {path}");
        let pr_body = format!(
            "This PR fixes a detected vulnerability.\n\n**Vulnerability:**\n{vulnerability}"
        );
        let pr = self
            .ctx
            .source_control
            .create_pull_request(&token, &owner, &repo, &pr_title, &pr_body, &fix_branch, &branch)
            .await?;

        info!(node_id = %node.id, pr = pr.number, url = %pr.url, "pull request opened");
        Ok(NodeResult::AutoFix(AutoFixResult::created(
            pr.url, pr.number, fix_branch,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ScanResult;

    #[test]
    fn infers_file_key_first() {
        let store = ResultStore::new();
        store.insert(
            Arc::from("s"),
            NodeResult::Scan(ScanResult::completed(
                "gitleaks",
                "t",
                r#"{"findings": [{"rule": "x", "file": "src/config.rs"}]}"#,
            )),
        );
        assert_eq!(infer_path(&store).as_deref(), Some("src/config.rs"));
    }

    #[test]
    fn infers_path_key_when_no_file_key() {
        let store = ResultStore::new();
        store.insert(
            Arc::from("s"),
            NodeResult::Scan(ScanResult::completed(
                "semgrep",
                "t",
                r#"{"results": [{"path": "main.go"}]}"#,
            )),
        );
        assert_eq!(infer_path(&store).as_deref(), Some("main.go"));
    }

    #[test]
    fn no_inferable_path_is_none() {
        let store = ResultStore::new();
        store.insert(
            Arc::from("s"),
            NodeResult::Scan(ScanResult::completed("nmap", "t", "80/tcp open")),
        );
        assert_eq!(infer_path(&store), None);
        assert_eq!(infer_path(&ResultStore::new()), None);
    }

    #[test]
    fn earliest_result_wins() {
        let store = ResultStore::new();
        store.insert(
            Arc::from("first"),
            NodeResult::Scan(ScanResult::completed("gitleaks", "t", r#""file": "a.rs""#)),
        );
        store.insert(
            Arc::from("second"),
            NodeResult::Scan(ScanResult::completed("semgrep", "t", r#""file": "b.rs""#)),
        );
        assert_eq!(infer_path(&store).as_deref(), Some("a.rs"));
    }

    #[test]
    fn language_detection() {
        assert_eq!(language_of("src/lib.rs"), "rust");
        assert_eq!(language_of("cmd/main.go"), "go");
        assert_eq!(language_of("app.py"), "python");
        assert_eq!(language_of("README.md"), "code");
        assert_eq!(language_of("Makefile"), "code");
    }
}
