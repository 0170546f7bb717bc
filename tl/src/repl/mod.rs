//! Interactive REPL for taskloop
//!
//! Drives the manual protocol one slash command at a time and prints loop
//! progress from the event bus while a run is in flight.

mod command;
mod session;

pub use command::{ReplCommand, parse_command};
pub use session::ReplSession;

use eyre::Result;

use crate::r#loop::LoopController;

/// Run the interactive REPL
///
/// This is the main entry point for `tl repl`.
pub async fn run_interactive(controller: LoopController) -> Result<()> {
    let mut session = ReplSession::new(controller);
    session.run().await
}
