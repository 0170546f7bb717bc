//! External task hints
//!
//! Hints are todo entries observed from an outside source (the backend's todo
//! list). They only seed a loop that has no tasks of its own.

use serde::{Deserialize, Serialize};

use super::Task;

/// Status of an externally observed todo entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    /// Anything the source reports that we don't recognize
    #[serde(other)]
    Other,
}

impl std::fmt::Display for HintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// One externally observed candidate task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintEntry {
    pub id: String,
    pub content: String,
    pub status: HintStatus,
}

impl HintEntry {
    pub fn new(id: impl Into<String>, content: impl Into<String>, status: HintStatus) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            status,
        }
    }

    /// Pending and in-progress hints are still open work
    pub fn is_open(&self) -> bool {
        matches!(self.status, HintStatus::Pending | HintStatus::InProgress)
    }

    /// Fresh pending task carrying this hint's id and content
    pub fn to_task(&self) -> Task {
        Task::new(self.id.clone(), self.content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskStatus;

    #[test]
    fn test_open_statuses() {
        assert!(HintEntry::new("1", "a", HintStatus::Pending).is_open());
        assert!(HintEntry::new("2", "b", HintStatus::InProgress).is_open());
        assert!(!HintEntry::new("3", "c", HintStatus::Completed).is_open());
        assert!(!HintEntry::new("4", "d", HintStatus::Cancelled).is_open());
    }

    #[test]
    fn test_to_task_discards_prior_status() {
        let hint = HintEntry::new("h1", "Fix the build", HintStatus::InProgress);
        let task = hint.to_task();
        assert_eq!(task.id, "h1");
        assert_eq!(task.content(), "Fix the build");
        assert_eq!(task.status(), TaskStatus::Pending);
    }

    #[test]
    fn test_deserialize_unknown_status() {
        let json = r#"{"id": "1", "content": "x", "status": "blocked"}"#;
        let hint: HintEntry = serde_json::from_str(json).unwrap();
        assert_eq!(hint.status, HintStatus::Other);
        assert!(!hint.is_open());
    }
}
