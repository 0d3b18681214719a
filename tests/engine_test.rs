//! End-to-end engine tests: full executions over stub collaborators

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{fixture, wait_terminal, workflow};
use strix::{EventKind, ExecutionStatus, Node, NodeKind};

// ═══════════════════════════════════════════════════════════════
// LINEAR HAPPY PATH
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn linear_trigger_scan_email_completes() {
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://example.com")),
            Node::new("n", NodeKind::Nmap),
            Node::new("e", NodeKind::Email).with_data("config", json!({"email": "a@b.c"})),
        ],
        &[("t", "n"), ("n", "e")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.results["t"]["target"], "https://example.com");
    assert_eq!(record.results["n"]["scanner"], "nmap");
    assert_eq!(record.results["n"]["status"], "completed");
    assert_eq!(record.results["e"]["status"], "sent");
    assert!(record.error.is_none());
    assert!(record.started_at.unwrap() <= record.completed_at.unwrap());

    // Tool binaries are absent in tests, so the scan took the mock path
    let output = record.results["n"]["output"].as_str().unwrap();
    assert!(output.contains("[MOCK]"));
    assert!(output.contains("https://example.com"));

    // Delivery went to the configured recipient with the trigger target
    let deliveries = f.notifier.deliveries.lock();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0], ("a@b.c".to_string(), "https://example.com".to_string()));
}

#[tokio::test]
async fn results_materialize_in_topological_order() {
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("a", NodeKind::Nmap),
            Node::new("b", NodeKind::Gobuster),
        ],
        &[("t", "a"), ("a", "b")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    let keys: Vec<&String> = record
        .results
        .keys()
        .filter(|k| !k.starts_with("ai_report"))
        .collect();
    assert_eq!(keys, vec!["t", "a", "b"]);
}

// ═══════════════════════════════════════════════════════════════
// CYCLES AND MALFORMED DEFINITIONS
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn cyclic_workflow_fails_before_any_node() {
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![Node::new("a", NodeKind::Nmap), Node::new("b", NodeKind::Nikto)],
        &[("a", "b"), ("b", "a")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Failed);
    assert!(record.error.as_ref().unwrap().contains("cycle"));
    assert!(record.results.is_empty(), "no node may be visited");
}

#[tokio::test]
async fn edge_to_unknown_node_fails_as_malformed() {
    let f = fixture().build();
    let mut def = workflow(f.owner, vec![Node::new("a", NodeKind::Trigger)], &[]);
    def.edges.push(strix::Edge::new("a", "ghost"));

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Failed);
    assert!(record.error.as_ref().unwrap().contains("STRX-001"));
}

// ═══════════════════════════════════════════════════════════════
// DECISION GATING AND SKIP CASCADE
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn false_decision_skips_downstream() {
    // T → secret-scan → D(vulnerabilities > 5) → auto-fix
    // The mock secret scan reports one leaked secret; 1 > 5 is false.
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger)
                .with_data("sourceUrl", json!("https://github.com/acme/widgets")),
            Node::new("s", NodeKind::SecretScan),
            Node::new("d", NodeKind::Decision)
                .with_data("variable", json!("vulnerabilities"))
                .with_data("operator", json!("gt"))
                .with_data("value", json!("5")),
            Node::new("f", NodeKind::AutoFix).with_data("path", json!("README.md")),
        ],
        &[("t", "s"), ("s", "d"), ("d", "f")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.results["s"]["data"]["leaked_secrets"], 1);
    assert_eq!(record.results["d"]["decision_result"], false);
    assert_eq!(record.results["d"]["actual_value"], 1.0);
    assert_eq!(record.results["f"]["status"], "skipped");
    assert!(record.results["f"]["reason"].as_str().unwrap().contains("d"));
    // The gated branch never touched source control
    assert!(f.source_control.branches.lock().is_empty());
}

#[tokio::test]
async fn skips_cascade_through_descendants() {
    // T → D(false) → A → B: both A and B skip
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("d", NodeKind::Decision)
                .with_data("variable", json!("vulnerabilities"))
                .with_data("operator", json!("gt"))
                .with_data("value", json!("100")),
            Node::new("a", NodeKind::Nmap),
            Node::new("b", NodeKind::Email),
        ],
        &[("t", "d"), ("d", "a"), ("a", "b")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.results["a"]["status"], "skipped");
    assert!(record.results["a"]["reason"]
        .as_str()
        .unwrap()
        .contains("Decision node d returned false"));
    assert_eq!(record.results["b"]["status"], "skipped");
    assert_eq!(record.results["b"]["reason"], "Parent a was skipped");
}

#[tokio::test]
async fn true_decision_lets_downstream_run() {
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("s", NodeKind::SecretScan),
            Node::new("d", NodeKind::Decision)
                .with_data("variable", json!("vulnerabilities"))
                .with_data("operator", json!("gt"))
                .with_data("value", json!("0")),
            Node::new("n", NodeKind::Nikto),
        ],
        &[("t", "s"), ("s", "d"), ("d", "n")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.results["d"]["decision_result"], true);
    assert_eq!(record.results["n"]["status"], "completed");
}

// ═══════════════════════════════════════════════════════════════
// HARD FAILURES
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn scanner_without_target_fails_execution() {
    let f = fixture().build();
    let def = workflow(f.owner, vec![Node::new("n", NodeKind::Nmap)], &[]);

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Failed);
    let error = record.error.unwrap();
    assert!(error.contains("n"));
    assert!(error.contains("STRX-031"), "error should carry NoTarget: {error}");
    assert_eq!(record.results["n"]["status"], "failed");
}

#[tokio::test]
async fn unknown_node_type_fails_at_that_node() {
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("mystery", NodeKind::Unknown("quantum-scan".to_string())),
            Node::new("after", NodeKind::Nmap),
        ],
        &[("t", "mystery"), ("mystery", "after")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Failed);
    assert!(record.error.as_ref().unwrap().contains("quantum-scan"));
    // The trigger ran, the unknown node is recorded failed, nothing after
    assert_eq!(record.results["t"]["status"], "completed");
    assert_eq!(record.results["mystery"]["status"], "failed");
    assert!(!record.results.contains_key("after"));
}

#[tokio::test]
async fn failed_execution_has_exactly_one_failed_node() {
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("bad", NodeKind::Unknown("nope".to_string())),
        ],
        &[("t", "bad")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    let failed: Vec<_> = record
        .results
        .values()
        .filter(|r| r["status"] == "failed")
        .collect();
    assert_eq!(failed.len(), 1);
}

// ═══════════════════════════════════════════════════════════════
// AUTO-FIX
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn auto_fix_opens_pull_request() {
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger)
                .with_data("sourceUrl", json!("https://github.com/acme/widgets")),
            Node::new("x", NodeKind::SecretScan),
            Node::new("f", NodeKind::AutoFix).with_data("path", json!("README.md")),
        ],
        &[("t", "x"), ("x", "f")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.results["f"]["status"], "created");
    assert!(record.results["f"]["branch"]
        .as_str()
        .unwrap()
        .starts_with("fix/vuln-"));
    assert_eq!(
        record.results["f"]["pr_url"],
        "https://github.com/acme/widgets/pull/7"
    );
    assert_eq!(record.results["f"]["pr_number"], 7);

    let branches = f.source_control.branches.lock();
    assert_eq!(branches.len(), 1);
    assert!(branches[0].starts_with("fix/vuln-"));
}

#[tokio::test]
async fn auto_fix_infers_path_from_scanner_output() {
    // The mock gitleaks payload names README.md; no path configured
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger)
                .with_data("sourceUrl", json!("https://github.com/acme/widgets")),
            Node::new("x", NodeKind::SecretScan),
            Node::new("f", NodeKind::AutoFix),
        ],
        &[("t", "x"), ("x", "f")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.results["f"]["status"], "created");
}

#[tokio::test]
async fn auto_fix_without_token_fails_execution() {
    let f = fixture().without_token().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger)
                .with_data("sourceUrl", json!("https://github.com/acme/widgets")),
            Node::new("f", NodeKind::AutoFix).with_data("path", json!("README.md")),
        ],
        &[("t", "f")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Failed);
    assert!(record.error.as_ref().unwrap().contains("STRX-060"));
}

#[tokio::test]
async fn auto_fix_without_repo_context_fails() {
    // Target is not a github URL and no owner/repo configured
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://example.com")),
            Node::new("f", NodeKind::AutoFix).with_data("path", json!("main.go")),
        ],
        &[("t", "f")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Failed);
    assert!(record.error.as_ref().unwrap().contains("STRX-061"));
}

// ═══════════════════════════════════════════════════════════════
// TERMINAL SOFT FAILURES
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn notification_failure_does_not_fail_execution() {
    let f = fixture().notifier_fails().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("n", NodeKind::Nmap),
            Node::new("e", NodeKind::Email).with_data("config", json!({"email": "x@x"})),
        ],
        &[("t", "n"), ("n", "e")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.results["e"]["status"], "failed");
    assert!(record.results["e"]["error"].as_str().unwrap().contains("502"));
    // Prior node results intact
    assert_eq!(record.results["n"]["status"], "completed");
}

#[tokio::test]
async fn soft_failed_terminal_does_not_gate_descendants() {
    // e soft-fails, but its descendant slack node still runs
    let f = fixture().notifier_fails().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("e", NodeKind::Email).with_data("email", json!("a@b.c")),
            Node::new("s", NodeKind::Slack).with_data("to", json!("#sec")),
        ],
        &[("t", "e"), ("e", "s")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.results["e"]["status"], "failed");
    // Not skipped: delivery failure is a soft outcome
    assert_eq!(record.results["s"]["status"], "failed");
    assert!(record.results["s"]["reason"].is_null());
}

#[tokio::test]
async fn notification_without_recipient_soft_fails() {
    let mut builder = fixture();
    builder = builder.notifier_fails(); // must not even be attempted
    let f = builder.build();

    // Owner store has an email, so force emptiness via explicit blank config
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("e", NodeKind::Email),
        ],
        &[("t", "e")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    // Falls back to the owner's email and the delivery attempt fails soft
    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.results["e"]["status"], "failed");
}

// ═══════════════════════════════════════════════════════════════
// GITHUB ISSUE TERMINAL
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn github_issue_created_from_scan_results() {
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger)
                .with_data("sourceUrl", json!("https://github.com/acme/widgets")),
            Node::new("s", NodeKind::DependencyCheck),
            Node::new("i", NodeKind::GithubIssue),
        ],
        &[("t", "s"), ("s", "i")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.results["i"]["status"], "created");
    assert_eq!(record.results["i"]["repository"], "acme/widgets");
    assert!(record.results["i"]["issue_url"]
        .as_str()
        .unwrap()
        .contains("/issues/9"));

    let issues = f.source_control.issues.lock();
    assert_eq!(issues.len(), 1);
    assert!(issues[0].1.contains("acme/widgets"));
}

#[tokio::test]
async fn github_issue_without_token_fails_execution() {
    let f = fixture().without_token().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger)
                .with_data("sourceUrl", json!("https://github.com/acme/widgets")),
            Node::new("i", NodeKind::GithubIssue),
        ],
        &[("t", "i")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Failed);
    assert!(record.error.as_ref().unwrap().contains("STRX-060"));
}

// ═══════════════════════════════════════════════════════════════
// BOUNDARY BEHAVIORS AND INVARIANTS
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn trigger_without_source_url_defaults() {
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![Node::new("t", NodeKind::Trigger), Node::new("n", NodeKind::Nmap)],
        &[("t", "n")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.results["t"]["target"], "example.com");
    assert_eq!(record.results["n"]["target"], "example.com");
}

#[tokio::test]
async fn trigger_with_empty_source_url_fails() {
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!(""))],
        &[],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Failed);
    assert!(record.error.as_ref().unwrap().contains("STRX-032"));
}

#[tokio::test]
async fn edgeless_workflow_runs_every_node_in_declared_order() {
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("z", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("m", NodeKind::FlowChart),
            Node::new("a", NodeKind::PolicyCheck),
        ],
        &[],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Completed);
    let keys: Vec<&String> = record
        .results
        .keys()
        .filter(|k| !k.starts_with("ai_report"))
        .collect();
    assert_eq!(keys, vec!["z", "m", "a"]);
}

#[tokio::test]
async fn every_visited_node_has_a_recognized_status() {
    let f = fixture().notifier_fails().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("s", NodeKind::SecretScan),
            Node::new("d", NodeKind::Decision)
                .with_data("variable", json!("vulnerabilities"))
                .with_data("operator", json!("gt"))
                .with_data("value", json!("5")),
            Node::new("skipme", NodeKind::Nikto),
            Node::new("e", NodeKind::Email).with_data("email", json!("a@b.c")),
        ],
        &[("t", "s"), ("s", "d"), ("d", "skipme"), ("t", "e")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    let allowed = ["completed", "skipped", "failed", "sent", "created"];
    for (node_id, result) in record.results.iter().filter(|(k, _)| !k.starts_with("ai_report")) {
        let status = result["status"].as_str().unwrap();
        assert!(allowed.contains(&status), "{node_id} has odd status {status}");
    }
}

#[tokio::test]
async fn completed_execution_has_no_hard_failed_scanner() {
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("a", NodeKind::Wpscan),
            Node::new("b", NodeKind::KubeBench),
            Node::new("c", NodeKind::IacScan),
        ],
        &[("t", "a"), ("a", "b"), ("b", "c")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Completed);
    for (_, result) in record.results.iter().filter(|(k, _)| !k.starts_with("ai_report")) {
        assert_ne!(result["status"], "failed");
    }
}

// ═══════════════════════════════════════════════════════════════
// EXECUTIVE REPORT
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn report_entry_written_with_derived_grading() {
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("s", NodeKind::SecretScan),
            Node::new("v", NodeKind::DependencyCheck),
        ],
        &[("t", "s"), ("s", "v")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    let report = &record.results["ai_report"];
    assert_eq!(report["ai_report"], "Mock security report");
    assert_eq!(report["generated_by"], "Strix AI");
    // One leaked secret + one dependency vulnerability
    assert_eq!(report["total_issues"], 2);
    assert_eq!(report["security_grade"], "B");
    assert!(report["report_date"].is_string());
}

#[tokio::test]
async fn report_failure_is_recorded_but_execution_completes() {
    let f = fixture().without_ai().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("n", NodeKind::Nmap),
        ],
        &[("t", "n")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Completed);
    assert!(!record.results.contains_key("ai_report"));
    assert!(record.results["ai_report_error"]
        .as_str()
        .unwrap()
        .contains("STRX-050"));
}

#[tokio::test]
async fn report_skipped_when_nothing_produced_output() {
    // A lone trigger has no output to aggregate
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev"))],
        &[],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Completed);
    assert!(!record.results.contains_key("ai_report"));
    assert!(!record.results.contains_key("ai_report_error"));
}

// ═══════════════════════════════════════════════════════════════
// COST AND DOCUMENT NODES
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn cost_pipeline_gates_on_monthly_cost() {
    // estimate-cost surfaces the mock infracost monthly total, and the
    // cost decision parses it with currency formatting stripped
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("c", NodeKind::EstimateCost),
            Node::new("d", NodeKind::Decision)
                .with_data("variable", json!("cost"))
                .with_data("operator", json!("gt"))
                .with_data("value", json!("100")),
            Node::new("docs", NodeKind::GenerateDocs),
        ],
        &[("t", "c"), ("c", "d"), ("d", "docs")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.results["c"]["monthly_cost"], "$154.20");
    assert_eq!(record.results["d"]["decision_result"], true);
    assert_eq!(record.results["d"]["actual_value"], 154.20);
    assert_eq!(record.results["docs"]["status"], "completed");
    assert_eq!(record.results["docs"]["files"][0], "README.md");
    assert_eq!(record.results["docs"]["output"], "Mock security report");
}

#[tokio::test]
async fn document_nodes_embed_structured_changes() {
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("iac", NodeKind::GenerateIac),
            Node::new("drift", NodeKind::DriftCheck),
            Node::new("policy", NodeKind::PolicyCheck),
        ],
        &[("t", "iac"), ("iac", "drift"), ("drift", "policy")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Completed);
    assert_eq!(record.results["iac"]["changes"][0]["path"], "main.tf");
    assert_eq!(record.results["iac"]["changes"][0]["type"], "create");
    assert_eq!(record.results["drift"]["drift_detected"], true);
    assert_eq!(record.results["drift"]["changes"][1]["type"], "delete");
    assert_eq!(record.results["policy"]["passed"], true);
    assert_eq!(record.results["policy"]["violations"], 0);
}

#[tokio::test]
async fn generate_docs_without_ai_fails_the_node() {
    let f = fixture().without_ai().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("docs", NodeKind::GenerateDocs),
        ],
        &[("t", "docs")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    let record = wait_terminal(&f.engine, id).await;

    assert_eq!(record.status, ExecutionStatus::Failed);
    assert_eq!(record.results["docs"]["status"], "failed");
    assert!(record.error.as_ref().unwrap().contains("STRX-050"));
}

// ═══════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn event_sequence_brackets_the_execution() {
    let f = fixture().build();
    let def = workflow(
        f.owner,
        vec![
            Node::new("t", NodeKind::Trigger).with_data("sourceUrl", json!("https://x.dev")),
            Node::new("n", NodeKind::Nmap),
        ],
        &[("t", "n")],
    );

    let id = f.engine.enqueue(def).await.unwrap();
    wait_terminal(&f.engine, id).await;

    let events = f.engine.event_log().filter_execution(id);
    assert!(matches!(events[0].kind, EventKind::ExecutionStarted { node_count: 2, .. }));
    assert!(matches!(
        events.last().unwrap().kind,
        EventKind::ExecutionCompleted { .. }
    ));

    let started: Vec<_> = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::NodeStarted { .. }))
        .collect();
    let completed: Vec<_> = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::NodeCompleted { .. }))
        .collect();
    assert_eq!(started.len(), 2);
    assert_eq!(completed.len(), 2);
}

#[tokio::test]
async fn failed_execution_emits_failure_event_with_node() {
    let f = fixture().build();
    let def = workflow(f.owner, vec![Node::new("n", NodeKind::Sqlmap)], &[]);

    let id = f.engine.enqueue(def).await.unwrap();
    wait_terminal(&f.engine, id).await;

    let events = f.engine.event_log().filter_execution(id);
    let failure = events
        .iter()
        .find_map(|e| match &e.kind {
            EventKind::ExecutionFailed { failed_node, .. } => Some(failed_node.clone()),
            _ => None,
        })
        .expect("ExecutionFailed event");
    assert_eq!(failure.as_deref(), Some("n"));
}
