//! Event bus for loop observability
//!
//! Every significant step of a loop emits a [`LoopEvent`] on a broadcast
//! channel. Consumers (the REPL progress printer, the hint listener) subscribe
//! independently; emitting never blocks and never fails.
//!
//! ```text
//!   LoopController ──┐                 ┌──> REPL progress output
//!   OpencodeBackend ─┼──> EventBus ────┼──> hint listener -> LoopRegistry
//!                    │   (broadcast)   │
//! ```

mod bus;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, spawn_hint_listener};
pub use types::LoopEvent;
