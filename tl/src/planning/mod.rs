//! Planning module - turns a free-text prompt into an ordered task list
//!
//! ```text
//! prompt → decompose.pmt → backend session → numbered list → Vec<String>
//! ```
//!
//! The planning call runs in its own session, separate from the sessions
//! later used to execute the tasks.

mod decomposer;

pub use decomposer::{DecomposeError, Decomposer, DecomposerConfig, parse_numbered_list};
