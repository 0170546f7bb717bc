//! Loop protocol errors
//!
//! The display text of each variant is the guidance shown to the caller.

use thiserror::Error;

use crate::planning::DecomposeError;

/// Errors surfaced by the loop protocols
///
/// None of these mutate loop state.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("Failed to decompose the prompt into tasks: {0}. No loop was started.")]
    Decomposition(#[from] DecomposeError),

    #[error(
        "The planner did not return any numbered tasks. Start a loop manually with start, add tasks with add-tasks, then call run."
    )]
    EmptyDecomposition,

    #[error("No active loop. Call start first, or use auto to plan and run in one step.")]
    NoActiveLoop,

    #[error("A loop is already running. Wait for it to finish; use status to follow progress.")]
    AlreadyRunning,

    #[error(
        "The loop has no tasks and there are no open todo hints. Add tasks with add-tasks (id + content for each), then call run again."
    )]
    NoTasks,
}

impl LoopError {
    /// Structural misuse (wrong call order or state) as opposed to a planning failure
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::NoActiveLoop | Self::AlreadyRunning | Self::NoTasks)
    }
}
