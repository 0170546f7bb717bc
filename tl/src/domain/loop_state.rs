//! Loop domain type
//!
//! One orchestration run: the original prompt, the model, and the ordered
//! task list with a cursor into it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::id::generate_id;
use super::{ModelConfig, Task, TaskStatus};

/// Per-status task counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
}

impl TaskCounts {
    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed + self.failed
    }

    pub fn get(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Pending => self.pending,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Completed => self.completed,
            TaskStatus::Failed => self.failed,
        }
    }
}

/// State of one orchestration run
#[derive(Debug, Clone, Serialize)]
pub struct Loop {
    /// Unique identifier
    pub id: String,

    /// The request the loop was started with
    original_prompt: String,

    /// Tasks in execution order
    pub tasks: Vec<Task>,

    /// Index of the task currently executing (None before the first one)
    current_index: Option<usize>,

    /// Model used for every task in this loop
    model: ModelConfig,

    /// True only while an execution pass is in progress
    pub running: bool,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Loop {
    /// Create an idle loop with no tasks
    pub fn new(original_prompt: impl Into<String>, model: ModelConfig) -> Self {
        let original_prompt = original_prompt.into();
        debug!(%original_prompt, %model, "Loop::new: called");
        Self {
            id: generate_id("loop", &original_prompt),
            original_prompt,
            tasks: Vec::new(),
            current_index: None,
            model,
            running: false,
            created_at: Utc::now(),
        }
    }

    /// Create a loop from task descriptions, numbering task ids from 1
    pub fn with_descriptions(original_prompt: impl Into<String>, model: ModelConfig, descriptions: Vec<String>) -> Self {
        let mut lp = Self::new(original_prompt, model);
        debug!(%lp.id, count = descriptions.len(), "Loop::with_descriptions: called");
        for (idx, content) in descriptions.into_iter().enumerate() {
            lp.tasks.push(Task::new(format!("task-{}", idx + 1), content));
        }
        lp
    }

    pub fn original_prompt(&self) -> &str {
        &self.original_prompt
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Point the cursor at `index`; the cursor never moves backwards
    pub fn advance_to(&mut self, index: usize) {
        debug!(%self.id, index, ?self.current_index, "Loop::advance_to: called");
        match self.current_index {
            Some(current) if index < current => {
                debug!("Loop::advance_to: ignoring backwards move");
            }
            _ => self.current_index = Some(index),
        }
    }

    /// Append pending tasks in the given order
    pub fn append(&mut self, tasks: impl IntoIterator<Item = Task>) {
        let before = self.tasks.len();
        self.tasks.extend(tasks);
        debug!(%self.id, added = self.tasks.len() - before, "Loop::append: called");
    }

    pub fn counts(&self) -> TaskCounts {
        let mut counts = TaskCounts::default();
        for task in &self.tasks {
            match task.status() {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    pub fn has_pending(&self) -> bool {
        self.tasks.iter().any(Task::is_pending)
    }
}
