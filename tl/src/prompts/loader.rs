//! Prompt Loader
//!
//! Loads prompt templates from the override directory or falls back to the
//! embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;

/// Phrase a task reply ends with, followed by a short summary
pub const COMPLETION_PHRASE: &str = "TASK COMPLETE:";

/// Context for the `decompose` template
#[derive(Debug, Clone, Serialize)]
pub struct DecomposeContext {
    pub prompt: String,
    pub min_tasks: usize,
    pub max_tasks: usize,
}

/// Context for the `task` template
#[derive(Debug, Clone, Serialize)]
pub struct TaskContext {
    /// The single task to work on
    pub task: String,
    /// The loop's original prompt, given as background only
    pub original_prompt: String,
    /// 1-based position of the task
    pub index: usize,
    pub total: usize,
    pub completion_phrase: &'static str,
}

impl TaskContext {
    pub fn new(task: impl Into<String>, original_prompt: impl Into<String>, index: usize, total: usize) -> Self {
        Self {
            task: task.into(),
            original_prompt: original_prompt.into(),
            index,
            total,
            completion_phrase: COMPLETION_PHRASE,
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.taskloop/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that checks `dir` before the embedded prompts
    ///
    /// A directory that does not exist is ignored.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let exists = dir.is_dir();
        debug!(?dir, %exists, "PromptLoader::new: checking directory");
        Self {
            hbs: Self::engine(),
            user_dir: exists.then(|| dir.to_path_buf()),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // prompts are plain text, not HTML
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `{dir}/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "load_template: called");
        if let Some(user_dir) = &self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "load_template: using user override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "load_template: using embedded prompt");
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Render the planning prompt
    pub fn decompose(&self, context: &DecomposeContext) -> Result<String> {
        self.render("decompose", context)
    }

    /// Render the per-task instruction
    pub fn task(&self, context: &TaskContext) -> Result<String> {
        self.render("task", context)
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}
