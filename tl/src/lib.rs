//! taskloop - sequential task loops over an agent session backend
//!
//! A loop is one prompt plus an ordered list of tasks. Each task runs in a
//! fresh backend session, strictly one after another, so no context leaks
//! between tasks. Tasks either come from a planning call (automatic
//! protocol) or are supplied by the caller (manual protocol).
//!
//! # Modules
//!
//! - [`domain`] - Task, Loop, ModelConfig and hint values
//! - [`backend`] - Execution backend trait and the HTTP implementation
//! - [`planning`] - Prompt decomposition into numbered tasks
//! - [`resolver`] - Model selection
//! - [`r#loop`] - Registry, executor and the loop protocols
//! - [`events`] - Broadcast event bus
//! - [`prompts`] - Handlebars prompt templates
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//! - [`repl`] - Interactive shell

pub mod backend;
pub mod cli;
pub mod config;
pub mod domain;
pub mod events;
pub mod planning;
pub mod prompts;
pub mod repl;
pub mod resolver;

// Note: 'loop' is a reserved keyword, so we use r#loop
#[path = "loop/mod.rs"]
pub mod r#loop;

// Re-export commonly used types
pub use backend::{BackendError, ExecutionBackend, OpencodeBackend, SessionId, SessionMessage};
pub use config::Config;
pub use domain::{HintEntry, HintStatus, Loop, ModelConfig, Task, TaskStatus};
pub use events::{EventBus, LoopEvent};
pub use r#loop::{LoopController, LoopError, LoopRegistry};
