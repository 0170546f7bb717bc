//! Prompt Template System
//!
//! Renders the instructions sent to the backend.
//!
//! Template loading chain:
//! 1. `{prompts-dir}/{name}.pmt` (user override, default `.taskloop/prompts/`)
//! 2. Embedded fallback compiled into the binary
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{COMPLETION_PHRASE, DecomposeContext, PromptLoader, TaskContext};
