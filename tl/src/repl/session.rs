//! REPL session management

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use super::command::{ReplCommand, parse_command};
use crate::domain::{HintStatus, TaskStatus};
use crate::events::LoopEvent;
use crate::r#loop::{LoopController, LoopError};

/// Interactive REPL session
pub struct ReplSession {
    controller: LoopController,
    progress: Option<JoinHandle<()>>,
}

/// Outcome of handling one command
enum SlashResult {
    Continue,
    Quit,
}

impl ReplSession {
    /// Create a new REPL session
    pub fn new(controller: LoopController) -> Self {
        Self {
            controller,
            progress: None,
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();
        self.progress = Some(spawn_progress_printer(self.controller.bus().subscribe()));

        // Create readline editor for proper line editing
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", "tl>".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    match self.handle_line(input).await {
                        SlashResult::Continue => continue,
                        SlashResult::Quit => break,
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C - just show new prompt
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D - exit
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        if let Some(handle) = self.progress.take() {
            handle.abort();
        }
        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "taskloop interactive shell".bright_cyan().bold());
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    async fn handle_line(&mut self, input: &str) -> SlashResult {
        let command = match parse_command(input) {
            Ok(command) => command,
            Err(msg) => {
                println!("{} {}", "?".yellow(), msg);
                return SlashResult::Continue;
            }
        };
        debug!(?command, "handle_line: dispatching");

        match command {
            ReplCommand::Start { model, prompt } => {
                print_outcome(self.controller.start(&prompt, model.as_deref()).await);
            }
            ReplCommand::Add { id, content } => {
                let entry = (id.unwrap_or_default(), content);
                print_outcome(self.controller.add_tasks(vec![entry]).await);
            }
            ReplCommand::Run => {
                print_outcome(self.controller.run().await);
            }
            ReplCommand::Auto { model, prompt } => {
                println!("{}", "Planning...".dimmed());
                print_outcome(self.controller.run_automatic(&prompt, model.as_deref()).await);
            }
            ReplCommand::Status => {
                println!("{}", self.controller.status().await);
            }
            ReplCommand::Hints => self.print_hints().await,
            ReplCommand::Help => self.print_help(),
            ReplCommand::Quit => return SlashResult::Quit,
        }
        SlashResult::Continue
    }

    async fn print_hints(&self) {
        let hints = self.controller.hints().await;
        if hints.is_empty() {
            println!("{}", "No todo hints received.".dimmed());
            return;
        }
        println!("{}", "Todo hints:".bright_cyan());
        for hint in hints {
            let status = match hint.status {
                HintStatus::Pending => "pending".normal(),
                HintStatus::InProgress => "in_progress".yellow(),
                HintStatus::Completed => "completed".green(),
                HintStatus::Cancelled => "cancelled".dimmed(),
                HintStatus::Other => "other".dimmed(),
            };
            println!("  {:12} {} {}", status, hint.id.dimmed(), hint.content);
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:28} Start a new loop", "/start [-m model] <prompt>".yellow());
        println!("  {:28} Add a task to the loop", "/add [id:] <content>".yellow());
        println!("  {:28} Run all pending tasks", "/run".yellow());
        println!("  {:28} Show the active loop", "/status".yellow());
        println!("  {:28} Plan and run in one step", "/auto [-m model] <prompt>".yellow());
        println!("  {:28} Show todo hints", "/hints".yellow());
        println!("  {:28} Show this help", "/help".yellow());
        println!("  {:28} Exit", "/quit".yellow());
        println!();
    }
}

fn print_outcome(outcome: Result<String, LoopError>) {
    match outcome {
        Ok(text) => println!("{}", text),
        Err(e) => println!("{} {}", "!".red().bold(), e),
    }
}

/// Print one line per task event while a pass runs
fn spawn_progress_printer(mut rx: broadcast::Receiver<LoopEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(line) = progress_line(&event) {
                        println!("{}", line);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn progress_line(event: &LoopEvent) -> Option<String> {
    match event {
        LoopEvent::LoopStarted { loop_id, task_count, .. } => Some(format!(
            "{} loop {} ({} tasks)",
            "==>".bright_cyan(),
            loop_id,
            task_count
        )),
        LoopEvent::TaskStarted {
            index,
            task_id,
            session_id,
            ..
        } => Some(format!(
            "{} [{}] {} {}",
            "->".bright_blue(),
            index + 1,
            task_id,
            format!("({})", session_id).dimmed()
        )),
        LoopEvent::TaskFinished {
            index,
            task_id,
            status,
            error,
            ..
        } => {
            let mark = match status {
                TaskStatus::Completed => "ok".green(),
                TaskStatus::Failed => "failed".red(),
                _ => status.to_string().normal(),
            };
            let detail = error.as_deref().map(|e| format!(": {}", e)).unwrap_or_default();
            Some(format!("   [{}] {} {}{}", index + 1, task_id, mark, detail))
        }
        LoopEvent::LoopFinished {
            completed, failed, ..
        } => Some(format!(
            "{} {} completed, {} failed",
            "<==".bright_cyan(),
            completed,
            failed
        )),
        LoopEvent::TodoUpdated { .. } => None,
    }
}
