//! taskloop - sequential agent task loops
//!
//! CLI entry point.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use taskloop::backend::{OpencodeBackend, SessionId};
use taskloop::cli::{Cli, Command};
use taskloop::config::Config;
use taskloop::events::{EventBus, spawn_hint_listener};
use taskloop::r#loop::{LoopController, LoopRegistry};
use taskloop::repl;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskloop")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("taskloop.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    info!(base_url = %config.backend.base_url, "taskloop starting");

    let backend =
        Arc::new(OpencodeBackend::from_config(&config.backend).context("Failed to create backend client")?);
    let bus = Arc::new(EventBus::with_default_capacity());
    let registry = LoopRegistry::new();
    let controller = LoopController::new(backend.clone(), registry.clone(), bus.clone(), &config);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Auto { prompt, model, session }) => {
            let controller = controller.with_context_session(session.map(SessionId::from));
            let report = controller.run_automatic(&prompt, model.as_deref()).await?;
            println!("{}", report);
        }
        Some(Command::Run { prompt, tasks, model }) => {
            controller.start(&prompt, model.as_deref()).await?;
            let entries = tasks
                .into_iter()
                .enumerate()
                .map(|(idx, content)| (format!("task-{}", idx + 1), content))
                .collect();
            controller.add_tasks(entries).await?;
            let report = controller.run().await?;
            println!("{}", report);
        }
        Some(Command::Repl { session }) => {
            run_repl(controller, backend, registry, bus, session).await?;
        }
        None => {
            run_repl(controller, backend, registry, bus, None).await?;
        }
    }

    Ok(())
}

async fn run_repl(
    controller: LoopController,
    backend: Arc<OpencodeBackend>,
    registry: LoopRegistry,
    bus: Arc<EventBus>,
    session: Option<String>,
) -> Result<()> {
    let session = session.map(SessionId::from);
    debug!(?session, "run_repl: called");

    let listener = spawn_hint_listener(&bus, registry, session.clone());
    let todos = match backend.subscribe_todos(bus.clone()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Todo hints unavailable");
            None
        }
    };

    let result = repl::run_interactive(controller.with_context_session(session)).await;

    if let Some(handle) = todos {
        handle.abort();
    }
    listener.abort();
    result
}
