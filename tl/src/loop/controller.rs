//! LoopController - the automatic and manual loop protocols
//!
//! Automatic: resolve model → decompose → install running loop → pass → report
//! Manual:    start → add_tasks* → run → report with loop-done marker
//!
//! Both protocols end in the same sequential pass. Task failures are recorded
//! on the task and never stop the pass; only structural misuse is returned as
//! a [`LoopError`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::executor::{ExecutionContext, TaskExecutor};
use super::registry::{LoopRegistry, RunStart};
use super::{LoopError, report};
use crate::backend::{ExecutionBackend, SessionId};
use crate::config::Config;
use crate::domain::{HintEntry, Loop, ModelConfig, Task, generate_id};
use crate::events::{EventBus, LoopEvent};
use crate::planning::{Decomposer, DecomposerConfig};
use crate::prompts::PromptLoader;
use crate::resolver::{ModelResolver, lookup_from_session};

/// Drives loops through their lifecycle
///
/// Cheap to clone; clones share the registry and event bus.
#[derive(Clone)]
pub struct LoopController {
    backend: Arc<dyn ExecutionBackend>,
    resolver: ModelResolver,
    decomposer: Decomposer,
    executor: TaskExecutor,
    registry: LoopRegistry,
    bus: Arc<EventBus>,
    /// Session whose latest assistant model is used when none is given
    context_session: Option<SessionId>,
    message_limit: usize,
}

impl LoopController {
    pub fn new(backend: Arc<dyn ExecutionBackend>, registry: LoopRegistry, bus: Arc<EventBus>, config: &Config) -> Self {
        debug!("LoopController::new: called");
        let prompts = Arc::new(PromptLoader::new(&config.prompts.dir));
        Self {
            resolver: ModelResolver::new(config.model.to_model_config()),
            decomposer: Decomposer::new(
                backend.clone(),
                prompts.clone(),
                DecomposerConfig::from(&config.loop_config),
            ),
            executor: TaskExecutor::new(backend.clone(), prompts),
            backend,
            registry,
            bus,
            context_session: None,
            message_limit: config.loop_config.message_limit,
        }
    }

    /// Use `session` for contextual model lookup
    pub fn with_context_session(mut self, session: Option<SessionId>) -> Self {
        debug!(?session, "with_context_session: called");
        self.context_session = session;
        self
    }

    pub fn registry(&self) -> &LoopRegistry {
        &self.registry
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Current todo hints
    pub async fn hints(&self) -> Vec<HintEntry> {
        self.registry.hints().await
    }

    async fn resolve_model(&self, explicit: Option<&str>) -> ModelConfig {
        let backend = self.backend.clone();
        let session = self.context_session.clone();
        let limit = self.message_limit;
        self.resolver
            .resolve(explicit, || async move {
                match session {
                    Some(session) => lookup_from_session(backend.as_ref(), &session, limit).await,
                    None => Ok(None),
                }
            })
            .await
    }

    /// Plan `prompt` into tasks and run them all
    pub async fn run_automatic(&self, prompt: &str, explicit_model: Option<&str>) -> Result<String, LoopError> {
        debug!(prompt_len = prompt.len(), ?explicit_model, "run_automatic: called");
        let model = self.resolve_model(explicit_model).await;

        if self.registry.is_running().await {
            debug!("run_automatic: a loop is already running");
            return Err(LoopError::AlreadyRunning);
        }

        let descriptions = self.decomposer.decompose(prompt, Some(&model)).await?;
        if descriptions.is_empty() {
            warn!("Decomposition produced no tasks, no loop created");
            return Err(LoopError::EmptyDecomposition);
        }

        let lp = self
            .registry
            .install_running(Loop::with_descriptions(prompt, model, descriptions))
            .await?;
        let finished = self.execute_pass(&lp, |_| false).await;
        Ok(report::run_report(&finished, false))
    }

    /// Install an empty idle loop for the manual protocol
    pub async fn start(&self, prompt: &str, explicit_model: Option<&str>) -> Result<String, LoopError> {
        debug!(prompt_len = prompt.len(), ?explicit_model, "start: called");
        if self.registry.is_running().await {
            debug!("start: a loop is already running");
            return Err(LoopError::AlreadyRunning);
        }
        let model = self.resolve_model(explicit_model).await;
        let lp = Loop::new(prompt, model);
        self.registry.install_idle(lp.clone()).await?;
        Ok(report::start_guidance(&lp))
    }

    /// Append `(id, content)` tasks to the idle loop, in order
    ///
    /// An empty id is replaced with a generated one.
    pub async fn add_tasks(&self, entries: Vec<(String, String)>) -> Result<String, LoopError> {
        debug!(count = entries.len(), "add_tasks: called");
        let tasks: Vec<Task> = entries
            .into_iter()
            .map(|(id, content)| {
                let id = if id.trim().is_empty() {
                    generate_id("task", &content)
                } else {
                    id
                };
                Task::new(id, content)
            })
            .collect();
        let added = tasks.len();
        let lp = self.registry.append(tasks).await?;
        info!(loop_id = %lp.id, added, "Tasks added");
        Ok(report::tasks_added(&lp, added))
    }

    /// Run every pending task of the idle loop
    pub async fn run(&self) -> Result<String, LoopError> {
        debug!("run: called");
        match self.registry.begin_run().await? {
            RunStart::NothingToDo(lp) => {
                info!(loop_id = %lp.id, "Nothing pending, run skipped");
                Ok(report::nothing_to_do(&lp))
            }
            RunStart::Started(lp) => {
                let finished = self.execute_pass(&lp, |task| !task.is_pending()).await;
                Ok(report::run_report(&finished, true))
            }
        }
    }

    /// Status of the active loop, or "No active loop."
    pub async fn status(&self) -> String {
        debug!("status: called");
        report::status(self.registry.snapshot().await.as_ref())
    }

    /// Execute the tasks of a running loop in index order, then clear the slot
    ///
    /// Tasks matching `skip` are left untouched. Returns the final loop state.
    async fn execute_pass<F>(&self, lp: &Loop, skip: F) -> Loop
    where
        F: Fn(&Task) -> bool,
    {
        info!(loop_id = %lp.id, tasks = lp.tasks.len(), "Execution pass starting");
        self.bus.emit(LoopEvent::LoopStarted {
            loop_id: lp.id.clone(),
            prompt: lp.original_prompt().to_string(),
            task_count: lp.tasks.len(),
        });

        let ctx = ExecutionContext::from_loop(lp);
        let mut local = lp.clone();

        for index in 0..lp.tasks.len() {
            let Some(mut task) = self.registry.advance(&lp.id, index).await else {
                warn!(loop_id = %lp.id, index, "Loop left the registry mid-pass");
                break;
            };
            if skip(&task) {
                debug!(task_id = %task.id, status = %task.status(), "execute_pass: skipping task");
                continue;
            }

            if let Some(session) = self.executor.begin(&mut task).await {
                self.registry.update_task(&lp.id, index, task.clone()).await;
                self.bus.emit(LoopEvent::TaskStarted {
                    loop_id: lp.id.clone(),
                    index,
                    task_id: task.id.clone(),
                    session_id: session.to_string(),
                });
                self.executor.finish(&mut task, &session, &ctx, index).await;
            }

            self.registry.update_task(&lp.id, index, task.clone()).await;
            self.bus.emit(LoopEvent::TaskFinished {
                loop_id: lp.id.clone(),
                index,
                task_id: task.id.clone(),
                status: task.status(),
                error: task.error_detail().map(str::to_string),
            });
            local.tasks[index] = task;
        }

        let mut finished = self.registry.finish_run(&lp.id).await.unwrap_or(local);
        finished.running = false;
        let counts = finished.counts();
        info!(
            loop_id = %finished.id,
            completed = counts.completed,
            failed = counts.failed,
            "Execution pass finished"
        );
        self.bus.emit(LoopEvent::LoopFinished {
            loop_id: finished.id.clone(),
            completed: counts.completed,
            failed: counts.failed,
        });
        finished
    }
}
