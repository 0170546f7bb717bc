//! TaskExecutor - runs one task in its own backend session
//!
//! Execution is split in two so the caller can publish the `in_progress`
//! state while the prompt is in flight:
//! - `begin`: open a session and mark the task `in_progress`
//! - `finish`: send the instruction, wait for the reply, record the outcome
//!
//! Neither half returns an error; every failure is recorded on the task.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::{ExecutionBackend, SessionId};
use crate::domain::{Loop, ModelConfig, Task};
use crate::prompts::{COMPLETION_PHRASE, PromptLoader, TaskContext};

/// Error detail recorded when no session could be opened for a task
pub const SESSION_FAILURE: &str = "Failed to create session";

/// Loop-level inputs shared by every task in a run
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// The loop's prompt, given to each task as background
    pub original_prompt: String,
    /// Model sent with every prompt; None lets the backend choose
    pub model: Option<ModelConfig>,
    /// Number of tasks in the loop
    pub total: usize,
}

impl ExecutionContext {
    pub fn from_loop(lp: &Loop) -> Self {
        Self {
            original_prompt: lp.original_prompt().to_string(),
            model: Some(lp.model().clone()),
            total: lp.tasks.len(),
        }
    }
}

/// Executes tasks against the backend
#[derive(Clone)]
pub struct TaskExecutor {
    backend: Arc<dyn ExecutionBackend>,
    prompts: Arc<PromptLoader>,
}

impl TaskExecutor {
    pub fn new(backend: Arc<dyn ExecutionBackend>, prompts: Arc<PromptLoader>) -> Self {
        debug!("TaskExecutor::new: called");
        Self { backend, prompts }
    }

    /// Open a session for `task` and mark it `in_progress`
    ///
    /// Returns None when the task could not be started; the task is then
    /// `failed` with [`SESSION_FAILURE`] as its detail.
    pub async fn begin(&self, task: &mut Task) -> Option<SessionId> {
        debug!(task_id = %task.id, "begin: called");
        let session = match self.backend.create_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "Could not create session for task");
                if let Err(te) = task.fail_unstarted(SESSION_FAILURE) {
                    warn!(error = %te, "begin: task was not pending");
                }
                return None;
            }
        };

        match task.start(session.as_str()) {
            Ok(()) => {
                info!(task_id = %task.id, %session, "Task started");
                Some(session)
            }
            Err(te) => {
                warn!(error = %te, "begin: task was not pending");
                None
            }
        }
    }

    /// Send the task instruction in `session` and record the outcome
    ///
    /// `index` is the task's 0-based position in the loop.
    pub async fn finish(&self, task: &mut Task, session: &SessionId, ctx: &ExecutionContext, index: usize) {
        debug!(task_id = %task.id, %session, index, "finish: called");
        let instruction = match self
            .prompts
            .task(&TaskContext::new(task.content(), &ctx.original_prompt, index + 1, ctx.total))
        {
            Ok(text) => text,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "Could not render task prompt");
                Self::record_failure(task, e.to_string());
                return;
            }
        };

        match self.backend.prompt(session, &instruction, ctx.model.as_ref()).await {
            Ok(reply) => {
                let summary = extract_summary(&reply.text());
                if summary.is_none() {
                    debug!(task_id = %task.id, "finish: reply has no completion phrase");
                }
                match task.complete(summary) {
                    Ok(()) => info!(task_id = %task.id, "Task completed"),
                    Err(te) => warn!(error = %te, "finish: task was not in progress"),
                }
            }
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "Task failed");
                Self::record_failure(task, e.to_string());
            }
        }
    }

    /// Run `task` start to finish
    pub async fn run(&self, task: &mut Task, ctx: &ExecutionContext, index: usize) {
        debug!(task_id = %task.id, index, "run: called");
        if let Some(session) = self.begin(task).await {
            self.finish(task, &session, ctx, index).await;
        }
    }

    fn record_failure(task: &mut Task, detail: String) {
        if let Err(te) = task.fail(detail) {
            warn!(error = %te, "record_failure: task was not in progress");
        }
    }
}

/// Text after the last completion phrase in `reply`, if any
fn extract_summary(reply: &str) -> Option<String> {
    let (_, after) = reply.rsplit_once(COMPLETION_PHRASE)?;
    let summary = after.lines().next().unwrap_or_default().trim();
    (!summary.is_empty()).then(|| summary.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::domain::TaskStatus;

    fn executor(backend: Arc<MockBackend>) -> TaskExecutor {
        TaskExecutor::new(backend, Arc::new(PromptLoader::embedded_only()))
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext {
            original_prompt: "Build a todo app".to_string(),
            model: Some(ModelConfig::new("anthropic", "claude-sonnet-4")),
            total: 3,
        }
    }

    #[test]
    fn test_extract_summary() {
        assert_eq!(
            extract_summary("Did things.\nTASK COMPLETE: added the parser"),
            Some("added the parser".to_string())
        );
        assert_eq!(
            extract_summary("TASK COMPLETE: first\nmore\nTASK COMPLETE: second\ntrailing"),
            Some("second".to_string())
        );
        assert_eq!(extract_summary("TASK COMPLETE:   "), None);
        assert_eq!(extract_summary("no phrase here"), None);
    }

    #[test]
    fn test_context_from_loop() {
        let lp = Loop::with_descriptions(
            "prompt",
            ModelConfig::new("p", "m"),
            vec!["a".to_string(), "b".to_string()],
        );
        let ctx = ExecutionContext::from_loop(&lp);
        assert_eq!(ctx.original_prompt, "prompt");
        assert_eq!(ctx.model, Some(ModelConfig::new("p", "m")));
        assert_eq!(ctx.total, 2);
    }

    #[tokio::test]
    async fn test_run_success() {
        let backend = Arc::new(MockBackend::new());
        let mut task = Task::new("t1", "Write the README");
        executor(backend.clone()).run(&mut task, &ctx(), 0).await;

        assert_eq!(task.status(), TaskStatus::Completed);
        assert_eq!(task.execution_ref(), Some("ses_0"));
        assert_eq!(task.summary(), Some("done"));
        assert!(task.error_detail().is_none());

        let prompts = backend.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].text.contains("Write the README"));
        assert!(prompts[0].text.contains("Build a todo app"));
        assert!(prompts[0].text.contains("task 1 of 3"));
        assert_eq!(prompts[0].model, ctx().model);
    }

    #[tokio::test]
    async fn test_run_without_model_omits_it() {
        let backend = Arc::new(MockBackend::new());
        let mut task = Task::new("t1", "x");
        let ctx = ExecutionContext { model: None, ..ctx() };
        executor(backend.clone()).run(&mut task, &ctx, 0).await;
        assert!(backend.prompts()[0].model.is_none());
    }

    #[tokio::test]
    async fn test_session_failure_marks_failed_without_ref() {
        let backend = Arc::new(MockBackend::new().with_failing_sessions(vec![0]));
        let mut task = Task::new("t1", "x");
        executor(backend.clone()).run(&mut task, &ctx(), 0).await;

        assert_eq!(task.status(), TaskStatus::Failed);
        assert_eq!(task.error_detail(), Some(SESSION_FAILURE));
        assert!(task.execution_ref().is_none());
        assert!(backend.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_failure_records_error_display() {
        let backend = Arc::new(MockBackend::new().with_fail_marker("explode"));
        let mut task = Task::new("t1", "please explode");
        executor(backend).run(&mut task, &ctx(), 1).await;

        assert_eq!(task.status(), TaskStatus::Failed);
        assert_eq!(task.execution_ref(), Some("ses_0"));
        assert_eq!(task.error_detail(), Some("API error 500: mock failure"));
    }

    #[tokio::test]
    async fn test_begin_then_finish() {
        let backend = Arc::new(MockBackend::new());
        let exec = executor(backend);
        let mut task = Task::new("t1", "x");

        let session = exec.begin(&mut task).await.unwrap();
        assert_eq!(task.status(), TaskStatus::InProgress);
        assert_eq!(task.execution_ref(), Some(session.as_str()));

        exec.finish(&mut task, &session, &ctx(), 2).await;
        assert_eq!(task.status(), TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_begin_on_terminal_task_does_nothing_to_it() {
        let backend = Arc::new(MockBackend::new());
        let exec = executor(backend);
        let mut task = Task::new("t1", "x");
        exec.run(&mut task, &ctx(), 0).await;
        let before = task.clone();

        assert!(exec.begin(&mut task).await.is_none());
        assert_eq!(task, before);
    }
}
