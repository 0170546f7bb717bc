//! Domain types for taskloop
//!
//! Core domain types: Task, Loop, ModelConfig, HintEntry.
//! These are plain in-memory values; nothing here is persisted.

mod hint;
mod id;
mod loop_state;
mod model;
mod task;

pub use hint::{HintEntry, HintStatus};
pub use id::generate_id;
pub use loop_state::{Loop, TaskCounts};
pub use model::ModelConfig;
pub use task::{Task, TaskStatus, TransitionError};
