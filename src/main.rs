//! Strix CLI - run and validate stored workflow definitions

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::IntoDiagnostic;
use rustc_hash::FxHashSet;
use uuid::Uuid;

use strix::{
    AiAdapter, Engine, ExecutionStatus, GitHubClient, HandlerContext, InMemoryExecutionStore,
    InMemoryUserStore, Notifier, Owner, ToolAdapter, WebhookNotifier, WorkflowDef,
};

#[derive(Parser)]
#[command(name = "strix")]
#[command(about = "Strix - DAG workflow engine for security-analysis pipelines")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow definition file end-to-end
    Run {
        /// Path to a workflow JSON file (nodes + edges)
        file: String,

        /// Recipient for notification terminals without one configured
        #[arg(short, long, default_value = "demo@example.com")]
        email: String,
    },

    /// Parse and schedule a workflow file without executing it
    Validate {
        /// Path to a workflow JSON file
        file: String,
    },
}

/// Prints reports to stdout when no notification gateway is configured
struct ConsoleNotifier;

#[async_trait::async_trait]
impl Notifier for ConsoleNotifier {
    async fn send_report(
        &self,
        recipient: &str,
        target: &str,
        status: &str,
        report: &str,
    ) -> strix::Result<()> {
        println!(
            "\n{} report for {recipient} (target {target}, {status}):\n{report}\n",
            "→".cyan()
        );
        Ok(())
    }
}

fn load_definition(path: &str, owner: Uuid) -> miette::Result<WorkflowDef> {
    let raw = std::fs::read_to_string(path).into_diagnostic()?;
    let mut value: serde_json::Value = serde_json::from_str(&raw).into_diagnostic()?;

    // Stored definitions carry id/owner; standalone files may not
    if let Some(object) = value.as_object_mut() {
        object
            .entry("id")
            .or_insert_with(|| serde_json::json!(Uuid::new_v4()));
        object.entry("owner").or_insert_with(|| serde_json::json!(owner));
    }

    WorkflowDef::parse(value).map_err(miette::Report::new)
}

fn build_engine(email: &str, owner: Uuid) -> Engine {
    let users = InMemoryUserStore::new();
    users.insert(Owner {
        id: owner,
        email: email.to_string(),
        access_token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
    });

    let notifier: Arc<dyn Notifier> = match std::env::var("STRIX_NOTIFY_URL") {
        Ok(url) if !url.is_empty() => Arc::new(WebhookNotifier::new(url)),
        _ => Arc::new(ConsoleNotifier),
    };

    let ctx = HandlerContext {
        tools: ToolAdapter::system(),
        ai: AiAdapter::from_env(),
        source_control: Arc::new(GitHubClient::new()),
        notifier,
        users: Arc::new(users),
    };

    Engine::new(ctx, Arc::new(InMemoryExecutionStore::new()))
}

async fn run(file: &str, email: &str) -> miette::Result<()> {
    let owner = Uuid::new_v4();
    let def = load_definition(file, owner)?;
    let total = def.nodes.len();

    let engine = build_engine(email, owner);
    let execution_id = engine.enqueue(def).await.map_err(miette::Report::new)?;

    println!("{} Running workflow with {} nodes...\n", "→".cyan(), total);

    let mut printed: FxHashSet<String> = FxHashSet::default();
    loop {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let Some(record) = engine.status(execution_id).await else {
            continue;
        };

        for (node_id, result) in &record.results {
            if !printed.insert(node_id.clone()) {
                continue;
            }
            let status = result["status"].as_str().unwrap_or("?");
            let symbol = match status {
                "completed" | "sent" | "created" => "✓".green(),
                "skipped" => "⏭".yellow(),
                _ => "✗".red(),
            };
            println!("  {symbol} {node_id} {}", status.dimmed());
        }

        if record.status.is_terminal() {
            match record.status {
                ExecutionStatus::Completed => {
                    if let Some(report) = record.results.get("ai_report") {
                        let grade = report["security_grade"].as_str().unwrap_or("?");
                        println!(
                            "\n{} Security grade {grade}, {} issues ({} critical)",
                            "→".cyan(),
                            report["total_issues"],
                            report["critical_issues"],
                        );
                    }
                    println!("\n{} Done!\n", "✓".green());
                    return Ok(());
                }
                _ => {
                    let error = record.error.unwrap_or_default();
                    println!("\n{} Execution failed: {error}\n", "✗".red());
                    std::process::exit(1);
                }
            }
        }
    }
}

fn validate(file: &str) -> miette::Result<()> {
    let def = load_definition(file, Uuid::new_v4())?;
    let order = strix::topo_order(&def.nodes, &def.edges).map_err(miette::Report::new)?;

    println!("{} Definition is valid", "✓".green());
    println!("  {} nodes, {} edges", def.nodes.len(), def.edges.len());
    let ids: Vec<&str> = order.iter().map(|id| id.as_ref()).collect();
    println!("  order: {}", ids.join(" → "));
    Ok(())
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "strix=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { file, email } => run(&file, &email).await,
        Commands::Validate { file } => validate(&file),
    }
}
