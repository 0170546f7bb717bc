//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// taskloop - run a prompt as a sequence of isolated agent tasks
#[derive(Parser)]
#[command(
    name = "tl",
    about = "Run a prompt as a sequence of isolated agent tasks",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to the REPL)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan the prompt into tasks and run them all
    Auto {
        /// What to accomplish
        prompt: String,

        /// Model as provider/model (e.g. anthropic/claude-sonnet-4)
        #[arg(short, long)]
        model: Option<String>,

        /// Session whose last model is used when --model is not given
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Run the given tasks in order under one loop
    Run {
        /// The loop's overall goal, given to each task as background
        prompt: String,

        /// Task to run (repeat for more, executed in the order given)
        #[arg(short, long = "task", value_name = "TASK", required = true)]
        tasks: Vec<String>,

        /// Model as provider/model
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Interactive shell for the manual protocol
    Repl {
        /// Session used for the model fallback and todo hints
        #[arg(short, long)]
        session: Option<String>,
    },
}
