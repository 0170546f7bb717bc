//! Event types emitted on the bus

use serde::Serialize;

use crate::backend::SessionId;
use crate::domain::{HintEntry, TaskStatus};

/// Something that happened in a loop or was observed from the backend
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoopEvent {
    /// An execution pass began
    LoopStarted {
        loop_id: String,
        prompt: String,
        task_count: usize,
    },

    /// A task entered in_progress
    TaskStarted {
        loop_id: String,
        index: usize,
        task_id: String,
        session_id: String,
    },

    /// A task reached a terminal state
    TaskFinished {
        loop_id: String,
        index: usize,
        task_id: String,
        status: TaskStatus,
        error: Option<String>,
    },

    /// An execution pass ended and the loop was cleared
    LoopFinished {
        loop_id: String,
        completed: usize,
        failed: usize,
    },

    /// The backend's todo list changed
    TodoUpdated {
        session_id: SessionId,
        todos: Vec<HintEntry>,
    },
}

impl LoopEvent {
    /// Short name used in logs
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::LoopStarted { .. } => "loop_started",
            Self::TaskStarted { .. } => "task_started",
            Self::TaskFinished { .. } => "task_finished",
            Self::LoopFinished { .. } => "loop_finished",
            Self::TodoUpdated { .. } => "todo_updated",
        }
    }

    /// Loop this event belongs to, if any
    pub fn loop_id(&self) -> Option<&str> {
        match self {
            Self::LoopStarted { loop_id, .. }
            | Self::TaskStarted { loop_id, .. }
            | Self::TaskFinished { loop_id, .. }
            | Self::LoopFinished { loop_id, .. } => Some(loop_id.as_str()),
            Self::TodoUpdated { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HintStatus;

    #[test]
    fn test_event_type_and_loop_id() {
        let event = LoopEvent::TaskStarted {
            loop_id: "abc-loop".to_string(),
            index: 0,
            task_id: "task-1".to_string(),
            session_id: "ses_1".to_string(),
        };
        assert_eq!(event.event_type(), "task_started");
        assert_eq!(event.loop_id(), Some("abc-loop"));
    }

    #[test]
    fn test_serialize_tagged() {
        let event = LoopEvent::TodoUpdated {
            session_id: SessionId::new("ses_9"),
            todos: vec![HintEntry::new("1", "x", HintStatus::Pending)],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "todo_updated");
        assert_eq!(json["session_id"], "ses_9");
        assert_eq!(json["todos"][0]["status"], "pending");
        assert!(event.loop_id().is_none());
    }
}
