//! Loop module - one active loop, run task by task
//!
//! - `registry`: the single active-loop slot and the todo hint list
//! - `executor`: runs one task in a fresh backend session
//! - `controller`: the automatic and manual protocols over both
//! - `report`: text returned to callers

mod controller;
mod error;
mod executor;
mod registry;
pub mod report;

pub use controller::LoopController;
pub use error::LoopError;
pub use executor::{ExecutionContext, SESSION_FAILURE, TaskExecutor};
pub use registry::{LoopRegistry, RunStart};
