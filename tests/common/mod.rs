#![allow(dead_code)] // not every test binary uses every fixture

//! Shared fixtures: stub collaborators and an engine builder
//!
//! Handlers only see collaborator traits, so the stubs here stand in
//! for GitHub, the notification gateway, and installed scanner
//! binaries. The tool runner reports every binary as absent, which
//! drives the adapter down its mock path (with zero delay).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use strix::{
    AiAdapter, Edge, Engine, ExecutionRecord, HandlerContext, InMemoryExecutionStore,
    InMemoryUserStore, IssueInfo, MockProvider, Node, Notifier, Owner, PullRequestInfo,
    SourceControl, StrixError, ToolAdapter, ToolRunner, UserStore, WorkflowDef,
};

/// Tool runner with no binaries installed: every scan takes the mock path
pub struct NoTools;

#[async_trait]
impl ToolRunner for NoTools {
    fn exists(&self, _tool: &str) -> bool {
        false
    }

    async fn run(&self, tool: &str, _args: &[String]) -> strix::Result<(String, i32)> {
        panic!("run() must not be called when {tool} is absent");
    }
}

/// Notifier that records deliveries, optionally refusing them
#[derive(Default)]
pub struct StubNotifier {
    pub fail: bool,
    pub deliveries: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Notifier for StubNotifier {
    async fn send_report(
        &self,
        recipient: &str,
        target: &str,
        _status: &str,
        _report: &str,
    ) -> strix::Result<()> {
        if self.fail {
            return Err(StrixError::Notify {
                reason: "gateway returned 502".to_string(),
            });
        }
        self.deliveries
            .lock()
            .push((recipient.to_string(), target.to_string()));
        Ok(())
    }
}

/// Source-control stub that succeeds on every call and records branches
#[derive(Default)]
pub struct StubSourceControl {
    pub branches: Mutex<Vec<String>>,
    pub issues: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl SourceControl for StubSourceControl {
    async fn get_file_content(
        &self,
        _token: &str,
        _owner: &str,
        _repo: &str,
        _path: &str,
    ) -> strix::Result<String> {
        Ok("const SECRET: &str = \"password123\";".to_string())
    }

    async fn create_issue(
        &self,
        _token: &str,
        owner: &str,
        repo: &str,
        title: &str,
        _body: &str,
    ) -> strix::Result<IssueInfo> {
        self.issues
            .lock()
            .push((format!("{owner}/{repo}"), title.to_string()));
        Ok(IssueInfo {
            id: 42,
            number: 9,
            url: format!("https://github.com/{owner}/{repo}/issues/9"),
        })
    }

    async fn get_reference(
        &self,
        _token: &str,
        _owner: &str,
        _repo: &str,
        _ref: &str,
    ) -> strix::Result<String> {
        Ok("base-sha-abc123".to_string())
    }

    async fn create_branch(
        &self,
        _token: &str,
        _owner: &str,
        _repo: &str,
        new_branch: &str,
        _base_sha: &str,
    ) -> strix::Result<()> {
        self.branches.lock().push(new_branch.to_string());
        Ok(())
    }

    async fn get_file_sha(
        &self,
        _token: &str,
        _owner: &str,
        _repo: &str,
        _path: &str,
        _branch: &str,
    ) -> strix::Result<String> {
        Ok("file-sha-def456".to_string())
    }

    async fn update_file(
        &self,
        _token: &str,
        _owner: &str,
        _repo: &str,
        _path: &str,
        _content: &str,
        _sha: &str,
        _message: &str,
        _branch: &str,
    ) -> strix::Result<()> {
        Ok(())
    }

    async fn create_pull_request(
        &self,
        _token: &str,
        owner: &str,
        repo: &str,
        _title: &str,
        _body: &str,
        _head: &str,
        _base: &str,
    ) -> strix::Result<PullRequestInfo> {
        Ok(PullRequestInfo {
            number: 7,
            url: format!("https://github.com/{owner}/{repo}/pull/7"),
        })
    }
}

pub struct Fixture {
    pub engine: Engine,
    pub owner: Uuid,
    pub notifier: Arc<StubNotifier>,
    pub source_control: Arc<StubSourceControl>,
}

pub struct FixtureBuilder {
    notifier_fails: bool,
    token: Option<String>,
    ai_configured: bool,
}

impl FixtureBuilder {
    pub fn notifier_fails(mut self) -> Self {
        self.notifier_fails = true;
        self
    }

    pub fn without_token(mut self) -> Self {
        self.token = None;
        self
    }

    pub fn without_ai(mut self) -> Self {
        self.ai_configured = false;
        self
    }

    pub fn build(self) -> Fixture {
        let owner = Uuid::new_v4();
        let users = InMemoryUserStore::new();
        users.insert(Owner {
            id: owner,
            email: "owner@acme.dev".to_string(),
            access_token: self.token,
        });

        let notifier = Arc::new(StubNotifier {
            fail: self.notifier_fails,
            deliveries: Mutex::new(Vec::new()),
        });
        let source_control = Arc::new(StubSourceControl::default());

        let ai = if self.ai_configured {
            AiAdapter::new(vec![Arc::new(MockProvider::new("Mock security report"))])
        } else {
            AiAdapter::new(vec![])
        };

        let ctx = HandlerContext {
            tools: ToolAdapter::new(Arc::new(NoTools)).with_mock_delay(Duration::ZERO),
            ai,
            source_control: Arc::clone(&source_control) as Arc<dyn SourceControl>,
            notifier: Arc::clone(&notifier) as Arc<dyn Notifier>,
            users: Arc::new(users) as Arc<dyn UserStore>,
        };

        Fixture {
            engine: Engine::new(ctx, Arc::new(InMemoryExecutionStore::new())),
            owner,
            notifier,
            source_control,
        }
    }
}

pub fn fixture() -> FixtureBuilder {
    FixtureBuilder {
        notifier_fails: false,
        token: Some("ghp_test_token".to_string()),
        ai_configured: true,
    }
}

/// Workflow from node list + edge pairs
pub fn workflow(owner: Uuid, nodes: Vec<Node>, edges: &[(&str, &str)]) -> WorkflowDef {
    WorkflowDef::new(
        owner,
        nodes,
        edges.iter().map(|(s, t)| Edge::new(*s, *t)).collect(),
    )
}

/// Poll until the execution reaches a terminal status
pub async fn wait_terminal(engine: &Engine, execution_id: Uuid) -> ExecutionRecord {
    for _ in 0..500 {
        if let Some(record) = engine.status(execution_id).await {
            if record.status.is_terminal() {
                return record;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("execution {execution_id} did not reach a terminal status");
}
