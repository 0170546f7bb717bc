//! Execution backend for taskloop
//!
//! The backend is the session runtime that actually carries out a task's
//! instructions. taskloop only needs three calls from it: open a session,
//! submit an instruction and wait for the full answer, and read back recent
//! messages.

mod error;
mod opencode;
mod types;

use async_trait::async_trait;

pub use error::BackendError;
pub use opencode::OpencodeBackend;
pub use types::{Part, Role, SessionId, SessionMessage, latest_assistant};

use crate::domain::ModelConfig;

/// Session runtime used to execute tasks
///
/// Every task gets its own session so no context leaks between tasks.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Open a fresh session
    async fn create_session(&self) -> Result<SessionId, BackendError>;

    /// Submit an instruction and block until the complete response is available
    ///
    /// `model` overrides the backend's default model when given.
    async fn prompt(
        &self,
        session: &SessionId,
        text: &str,
        model: Option<&ModelConfig>,
    ) -> Result<SessionMessage, BackendError>;

    /// Fetch up to `limit` most recent messages, oldest first
    async fn messages(&self, session: &SessionId, limit: usize) -> Result<Vec<SessionMessage>, BackendError>;
}
