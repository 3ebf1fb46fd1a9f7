//! herald - demo driver for the herald agent.
//!
//! Runs an in-process agent and talks to it with the client scenarios
//! (`demo`) or line by line from stdin (`repl`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use herald_core::domain::Task;
use herald_core::ports::{CancelSignal, WorkError, WorkUnit};
use herald_core::{Agent, AgentBuilder, AgentConfig, AgentResponse, Reply};

#[derive(Parser)]
#[command(name = "herald")]
#[command(about = "Run an in-process A2A task agent", long_about = None)]
#[command(version)]
struct Cli {
    /// YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Number of background workers
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// How long each task's work takes, in milliseconds
    #[arg(long, global = true)]
    work_ms: Option<u64>,

    /// Unit of work run for each accepted task
    #[arg(long, value_enum, default_value_t = WorkKind::Greeting, global = true)]
    work: WorkKind,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the synchronous, polling and streaming client scenarios
    Demo,

    /// Read commands from stdin, one per line, and print the replies
    Repl,
}

#[derive(Clone, Copy, ValueEnum)]
enum WorkKind {
    /// Wait, then answer with the configured greeting
    Greeting,
    /// Wait, then answer with a JSON echo of the request
    Echo,
}

/// Initialize a tracing subscriber with env-based filtering.
///
/// Default directive: `herald=info` (covers every `herald*` target).
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("herald=info".parse().unwrap_or_default());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Echoes the original request and task id back as JSON.
struct EchoWork {
    delay: std::time::Duration,
}

#[async_trait]
impl WorkUnit for EchoWork {
    async fn run(&self, task: &Task, mut cancel: CancelSignal) -> Result<String, WorkError> {
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => {}
            _ = cancel.canceled() => return Err(WorkError::Canceled),
        }
        let body = serde_json::json!({
            "task_id": task.id,
            "context_id": task.context_id,
            "request": task.original_request(),
        });
        serde_json::to_string(&body).map_err(|e| WorkError::Failed(format!("json encode: {e}")))
    }
}

fn load_config(cli: &Cli) -> Result<AgentConfig> {
    let mut config = AgentConfig::resolve(cli.config.as_deref()).context("loading config")?;
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(work_ms) = cli.work_ms {
        config.work_duration_ms = work_ms;
    }
    Ok(config)
}

fn build_agent(cli: &Cli, config: AgentConfig) -> Result<Agent> {
    let mut builder = AgentBuilder::new();
    if let WorkKind::Echo = cli.work {
        builder = builder.work_unit(Arc::new(EchoWork {
            delay: config.work_duration(),
        }));
    }
    builder.config(config).build().context("starting agent")
}

async fn run_demo(agent: &Agent) -> Result<()> {
    println!("== synchronous ==");
    let response = agent.send_message("Hello").await;
    println!("{}", serde_json::to_string(&response)?);

    println!("\n== submit + poll ==");
    let reply = agent.handle("Execute").await;
    println!("{reply}");
    let task_id = match reply {
        Reply::Accepted(task_id) => task_id,
        other => anyhow::bail!("execute was not accepted: {other}"),
    };
    let task = agent
        .poll(task_id, |task| println!("  poll: {}", task.state))
        .await?;
    println!("{}", agent.handle(&format!("Check {}", task.id)).await);

    println!("\n== streaming ==");
    let mut stream = agent.send_streaming("Execute").await;
    while let Some(response) = stream.next().await {
        println!("{}", serde_json::to_string(&response)?);
        if let AgentResponse::TerminalResult { .. } = response {
            break;
        }
    }

    println!("\n== counts ==");
    println!("{}", serde_json::to_string(&agent.counts().await?)?);
    Ok(())
}

async fn run_repl(agent: &Agent) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let output = match line.trim() {
            "" => continue,
            ":quit" | ":q" => break,
            ":counts" => serde_json::to_string(&agent.counts().await?)?,
            command => agent.handle(command).await.to_string(),
        };
        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    tracing::debug!(?config, "resolved config");
    let agent = build_agent(&cli, config)?;

    let outcome = match cli.command.unwrap_or(Commands::Demo) {
        Commands::Demo => run_demo(&agent).await,
        Commands::Repl => run_repl(&agent).await,
    };

    agent.shutdown().await;
    outcome
}
