//! Task domain type
//!
//! A Task is one atomic unit of work inside a loop. Its status only moves
//! forward: pending -> in_progress -> completed | failed.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting to run
    #[default]
    Pending,
    /// A session has been opened and the task is executing
    InProgress,
    /// The backend returned a complete response
    Completed,
    /// Session creation or the backend call failed
    Failed,
}

impl TaskStatus {
    /// Completed and failed tasks never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// All statuses in display order
    pub fn all() -> [TaskStatus; 4] {
        [Self::Pending, Self::InProgress, Self::Completed, Self::Failed]
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Rejected status transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid task transition for {task_id}: {from} -> {to}")]
pub struct TransitionError {
    pub task_id: String,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

/// One unit of work in a loop
///
/// Only serialized: statuses change through the checked transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    /// Unique identifier (caller-supplied or generated)
    pub id: String,

    /// What to do
    content: String,

    /// Current status
    status: TaskStatus,

    /// Session that ran this task
    execution_ref: Option<String>,

    /// Why the task failed
    error_detail: Option<String>,

    /// Summary reported by the backend after the completion phrase
    summary: Option<String>,
}

impl Task {
    /// Create a new pending task
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        let id = id.into();
        let content = content.into();
        debug!(%id, %content, "Task::new: called");
        Self {
            id,
            content,
            status: TaskStatus::Pending,
            execution_ref: None,
            error_detail: None,
            summary: None,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn execution_ref(&self) -> Option<&str> {
        self.execution_ref.as_deref()
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// Attach the session and move pending -> in_progress
    pub fn start(&mut self, session_id: impl Into<String>) -> Result<(), TransitionError> {
        let session_id = session_id.into();
        debug!(%self.id, %session_id, "Task::start: called");
        self.check(TaskStatus::Pending, TaskStatus::InProgress)?;
        self.execution_ref = Some(session_id);
        self.status = TaskStatus::InProgress;
        Ok(())
    }

    /// Move in_progress -> completed
    pub fn complete(&mut self, summary: Option<String>) -> Result<(), TransitionError> {
        debug!(%self.id, ?summary, "Task::complete: called");
        self.check(TaskStatus::InProgress, TaskStatus::Completed)?;
        self.summary = summary;
        self.status = TaskStatus::Completed;
        Ok(())
    }

    /// Move in_progress -> failed
    pub fn fail(&mut self, detail: impl Into<String>) -> Result<(), TransitionError> {
        let detail = detail.into();
        debug!(%self.id, %detail, "Task::fail: called");
        self.check(TaskStatus::InProgress, TaskStatus::Failed)?;
        self.error_detail = Some(detail);
        self.status = TaskStatus::Failed;
        Ok(())
    }

    /// Move pending -> failed when no session could be opened
    ///
    /// There is no execution reference to attach in this case.
    pub fn fail_unstarted(&mut self, detail: impl Into<String>) -> Result<(), TransitionError> {
        let detail = detail.into();
        debug!(%self.id, %detail, "Task::fail_unstarted: called");
        self.check(TaskStatus::Pending, TaskStatus::Failed)?;
        self.error_detail = Some(detail);
        self.status = TaskStatus::Failed;
        Ok(())
    }

    fn check(&self, expected: TaskStatus, to: TaskStatus) -> Result<(), TransitionError> {
        if self.status == expected {
            Ok(())
        } else {
            debug!(%self.id, from = %self.status, %to, "Task::check: rejected transition");
            Err(TransitionError {
                task_id: self.id.clone(),
                from: self.status,
                to,
            })
        }
    }
}
