//! Text reports returned by the loop protocols

use std::fmt::Write;

use crate::domain::{Loop, Task, TaskStatus};

/// Status text when the registry slot is empty
pub const NO_ACTIVE_LOOP: &str = "No active loop.";

/// Marker closing a manual run, carrying the total task count
pub fn loop_done_marker(total: usize) -> String {
    format!("<loop_done>{}</loop_done>", total)
}

/// One line per task plus indented session/error/summary lines
pub fn task_listing(tasks: &[Task]) -> String {
    let mut out = String::new();
    for (idx, task) in tasks.iter().enumerate() {
        let _ = writeln!(out, "[{}] {} ({}) {}", idx + 1, task.status(), task.id, task.content());
        if let Some(session) = task.execution_ref() {
            let _ = writeln!(out, "    session: {}", session);
        }
        if let Some(error) = task.error_detail() {
            let _ = writeln!(out, "    error: {}", error);
        }
        if let Some(summary) = task.summary() {
            let _ = writeln!(out, "    summary: {}", summary);
        }
    }
    out
}

/// Report for a finished pass
///
/// `manual` appends the loop-done marker.
pub fn run_report(lp: &Loop, manual: bool) -> String {
    let counts = lp.counts();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Loop {} finished: {} completed, {} failed ({} tasks)",
        lp.id,
        counts.completed,
        counts.failed,
        counts.total()
    );
    let _ = writeln!(out);
    out.push_str(&task_listing(&lp.tasks));
    if manual {
        let _ = writeln!(out);
        out.push_str(&loop_done_marker(counts.total()));
        out.push('\n');
    }
    out
}

/// Report for a manual run with nothing pending
pub fn nothing_to_do(lp: &Loop) -> String {
    let mut out = format!(
        "Nothing to do: every task in loop {} has already finished.\n\n",
        lp.id
    );
    out.push_str(&task_listing(&lp.tasks));
    out
}

/// Guidance returned after a manual start
pub fn start_guidance(lp: &Loop) -> String {
    format!(
        "Loop {} started with model {}.\n\
         Next: add tasks (id + content for each) with add-tasks, then call run.\n\
         If no tasks are added, run falls back to the session's open todo items.\n",
        lp.id,
        lp.model()
    )
}

/// Confirmation returned after tasks were appended
pub fn tasks_added(lp: &Loop, added: usize) -> String {
    let mut out = format!(
        "Added {} task(s) to loop {} ({} total). Call run to execute them.\n\n",
        added,
        lp.id,
        lp.tasks.len()
    );
    out.push_str(&task_listing(&lp.tasks));
    out
}

/// Full status of the active loop, or [`NO_ACTIVE_LOOP`]
pub fn status(lp: Option<&Loop>) -> String {
    let Some(lp) = lp else {
        return NO_ACTIVE_LOOP.to_string();
    };

    let counts = lp.counts();
    let mut out = String::new();
    let _ = writeln!(out, "Loop: {}", lp.id);
    let _ = writeln!(out, "Prompt: {}", lp.original_prompt());
    let _ = writeln!(out, "Model: {}", lp.model());
    let _ = writeln!(out, "Running: {}", if lp.running { "yes" } else { "no" });
    let _ = writeln!(out, "Created: {}", lp.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(idx) = lp.current_index() {
        let _ = writeln!(out, "Current: task {}", idx + 1);
    }
    let per_status: Vec<String> = TaskStatus::all()
        .iter()
        .map(|s| format!("{} {}", counts.get(*s), s))
        .collect();
    let _ = writeln!(out, "Tasks: {} total ({})", counts.total(), per_status.join(", "));
    if !lp.tasks.is_empty() {
        let _ = writeln!(out);
        out.push_str(&task_listing(&lp.tasks));
    }
    out
}
