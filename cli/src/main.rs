//! CLI entrypoint for agent-relay
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod cli;
mod progress;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use cli::{Cli, OutputFormat};
use colored::Colorize;
use progress::ProgressReporter;
use relay_application::{AgentDispatcher, CallerContext};
use relay_domain::{ToolCall, ToolCallOutcome};
use relay_infrastructure::{ConfigLoader, JsonlDispatchLogger, RegistryBuilder, ScriptedBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Console logging to stderr, plus an optional plain-text log file.
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| anyhow!("--log-file must name a file: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn read_batch(path: &PathBuf) -> Result<Vec<ToolCall>> {
    let raw = if path.as_os_str() == "-" {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("failed to read batch from stdin")?;
        raw
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read batch {}", path.display()))?
    };
    serde_json::from_str(&raw).context("batch must be a JSON array of {id, name, arguments} calls")
}

fn print_outcomes(outcomes: &[ToolCallOutcome], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(outcomes)?),
        OutputFormat::Text => {
            for outcome in outcomes {
                let status = match outcome.result.error_kind {
                    None if !outcome.result.is_error() => "ok".green(),
                    Some(kind) => kind.as_str().red(),
                    None => "error".red(),
                };
                println!(
                    "[{}] {} ({})",
                    outcome.correlation_id,
                    outcome.tool_name.bold(),
                    status
                );
                println!("{}", outcome.result.text_content());
                println!();
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.verbose, cli.log_file.as_deref())?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("failed to load configuration: {}", e))?
    };

    // === Dependency Injection ===
    let working_dir = std::env::current_dir().context("cannot determine working directory")?;
    let built = RegistryBuilder::new(Arc::new(ScriptedBackend::new()))
        .with_working_dir(working_dir)
        .build(&config)?;
    for issue in &built.warnings {
        warn!("{}", issue.message);
    }

    let caller = CallerContext::new(cli.caller.as_str()).with_hooks(built.caller_hooks);
    let registry = Arc::new(built.registry);
    let mut dispatcher = AgentDispatcher::new(Arc::clone(&registry)).with_params(built.params);
    if let Some(path) = &cli.event_log {
        let logger = JsonlDispatchLogger::new(path)
            .with_context(|| format!("cannot open event log {}", path.display()))?;
        dispatcher = dispatcher.with_logger(Arc::new(logger));
    }
    if !cli.quiet {
        dispatcher = dispatcher.with_progress(Arc::new(ProgressReporter::new()));
    }

    if cli.list_tools {
        let tools: Vec<_> = dispatcher
            .tool_definitions()
            .iter()
            .map(|t| t.to_api_tool())
            .collect();
        println!("{}", serde_json::to_string_pretty(&tools)?);
        registry.shutdown().await?;
        return Ok(());
    }

    let Some(batch_path) = &cli.batch else {
        bail!("A batch file is required. Use --list-tools to see the available agents.");
    };
    let calls = read_batch(batch_path).await?;
    info!(calls = calls.len(), agents = registry.len(), "Starting agent-relay");

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling batch");
                cancel.cancel();
            }
        });
    }
    if let Some(secs) = cli.deadline_secs {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            warn!(deadline_secs = secs, "Deadline reached, cancelling batch");
            cancel.cancel();
        });
    }

    let result = dispatcher
        .dispatch_cancellable(calls, &caller, &cancel)
        .await;

    if let Err(e) = registry.shutdown().await {
        warn!(error = %e, "Registry shutdown incomplete");
    }

    let outcomes = result?;
    print_outcomes(&outcomes, cli.output)
}
