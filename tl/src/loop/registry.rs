//! LoopRegistry - holder of the single active loop and the hint list
//!
//! The registry is an owned value shared by cloning (it wraps an Arc). Every
//! precondition check happens under the same lock acquisition as the state
//! change it guards, so two concurrent callers can never both pass a
//! "no loop is running" check. The lock is never held across a backend call.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::LoopError;
use crate::domain::{HintEntry, Loop, Task};

/// Outcome of preparing a manual run
#[derive(Debug)]
pub enum RunStart {
    /// The loop is now marked running; snapshot taken after the transition
    Started(Loop),
    /// Every task is already terminal; the loop was left untouched
    NothingToDo(Loop),
}

#[derive(Debug, Default)]
struct RegistryState {
    active: Option<Loop>,
    hints: Vec<HintEntry>,
}

/// Shared single-slot loop registry
#[derive(Debug, Clone, Default)]
pub struct LoopRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl LoopRegistry {
    pub fn new() -> Self {
        debug!("LoopRegistry::new: called");
        Self::default()
    }

    /// Copy of the active loop, if any
    pub async fn snapshot(&self) -> Option<Loop> {
        self.state.lock().await.active.clone()
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.active.as_ref().is_some_and(|lp| lp.running)
    }

    pub async fn hints(&self) -> Vec<HintEntry> {
        self.state.lock().await.hints.clone()
    }

    /// Replace the hint list
    pub async fn set_hints(&self, hints: Vec<HintEntry>) {
        debug!(count = hints.len(), "LoopRegistry::set_hints: called");
        self.state.lock().await.hints = hints;
    }

    /// Install an idle loop for the manual protocol and clear the hints
    ///
    /// An idle loop already in the slot is replaced; a running one is not.
    pub async fn install_idle(&self, lp: Loop) -> Result<(), LoopError> {
        debug!(%lp.id, "LoopRegistry::install_idle: called");
        let mut state = self.state.lock().await;
        if let Some(existing) = &state.active {
            if existing.running {
                debug!(%existing.id, "LoopRegistry::install_idle: existing loop is running");
                return Err(LoopError::AlreadyRunning);
            }
            warn!(replaced = %existing.id, "Replacing idle loop that was never run");
        }
        let mut lp = lp;
        lp.running = false;
        info!(loop_id = %lp.id, "Loop started (manual)");
        state.active = Some(lp);
        state.hints.clear();
        Ok(())
    }

    /// Install a loop that starts running immediately (automatic protocol)
    pub async fn install_running(&self, lp: Loop) -> Result<Loop, LoopError> {
        debug!(%lp.id, "LoopRegistry::install_running: called");
        let mut state = self.state.lock().await;
        if let Some(existing) = &state.active {
            if existing.running {
                debug!(%existing.id, "LoopRegistry::install_running: existing loop is running");
                return Err(LoopError::AlreadyRunning);
            }
            warn!(replaced = %existing.id, "Replacing idle loop with automatic run");
        }
        let mut lp = lp;
        lp.running = true;
        info!(loop_id = %lp.id, task_count = lp.tasks.len(), "Loop started (automatic)");
        state.active = Some(lp.clone());
        Ok(lp)
    }

    /// Append tasks to the idle active loop; returns the updated loop
    pub async fn append(&self, tasks: Vec<Task>) -> Result<Loop, LoopError> {
        debug!(count = tasks.len(), "LoopRegistry::append: called");
        let mut state = self.state.lock().await;
        let lp = state.active.as_mut().ok_or(LoopError::NoActiveLoop)?;
        if lp.running {
            return Err(LoopError::AlreadyRunning);
        }
        lp.append(tasks);
        Ok(lp.clone())
    }

    /// Check manual-run preconditions and mark the loop running
    ///
    /// A loop with no tasks is seeded from the open hints first.
    pub async fn begin_run(&self) -> Result<RunStart, LoopError> {
        debug!("LoopRegistry::begin_run: called");
        let mut state = self.state.lock().await;
        let RegistryState { active, hints } = &mut *state;
        let lp = active.as_mut().ok_or(LoopError::NoActiveLoop)?;
        if lp.running {
            return Err(LoopError::AlreadyRunning);
        }

        if lp.tasks.is_empty() {
            let seeded: Vec<Task> = hints.iter().filter(|h| h.is_open()).map(HintEntry::to_task).collect();
            if seeded.is_empty() {
                debug!("LoopRegistry::begin_run: no tasks and no open hints");
                return Err(LoopError::NoTasks);
            }
            info!(loop_id = %lp.id, count = seeded.len(), "Seeding loop from todo hints");
            lp.append(seeded);
        }

        if !lp.has_pending() {
            debug!(%lp.id, "LoopRegistry::begin_run: nothing pending");
            return Ok(RunStart::NothingToDo(lp.clone()));
        }

        lp.running = true;
        Ok(RunStart::Started(lp.clone()))
    }

    /// Move the cursor to `index` and return a copy of the task there
    pub async fn advance(&self, loop_id: &str, index: usize) -> Option<Task> {
        let mut state = self.state.lock().await;
        let lp = state.active.as_mut().filter(|lp| lp.id == loop_id)?;
        let task = lp.tasks.get(index).cloned()?;
        lp.advance_to(index);
        Some(task)
    }

    /// Write a task back into the active loop
    pub async fn update_task(&self, loop_id: &str, index: usize, task: Task) {
        debug!(%loop_id, index, status = %task.status(), "LoopRegistry::update_task: called");
        let mut state = self.state.lock().await;
        match state.active.as_mut().filter(|lp| lp.id == loop_id) {
            Some(lp) => {
                if let Some(slot) = lp.tasks.get_mut(index) {
                    *slot = task;
                }
            }
            None => warn!(%loop_id, "update_task: loop is no longer active"),
        }
    }

    /// End a run: clear the running flag and empty the slot
    ///
    /// Returns the final state of the loop.
    pub async fn finish_run(&self, loop_id: &str) -> Option<Loop> {
        debug!(%loop_id, "LoopRegistry::finish_run: called");
        let mut state = self.state.lock().await;
        if state.active.as_ref().is_some_and(|lp| lp.id == loop_id) {
            let mut lp = state.active.take()?;
            lp.running = false;
            info!(loop_id = %lp.id, "Loop finished and cleared");
            Some(lp)
        } else {
            warn!(%loop_id, "finish_run: loop is no longer active");
            None
        }
    }
}
