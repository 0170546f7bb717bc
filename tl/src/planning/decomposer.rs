//! Decomposer - planning call that splits a prompt into sequential tasks

use std::sync::{Arc, LazyLock};

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, ExecutionBackend, latest_assistant};
use crate::config::LoopConfig;
use crate::domain::ModelConfig;
use crate::prompts::{DecomposeContext, PromptLoader};

static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)[.)]\s*(.+)$").expect("numbered line pattern is valid"));

/// Errors from the planning call
#[derive(Debug, Error)]
pub enum DecomposeError {
    #[error("could not open a planning session: {0}")]
    SessionCreation(#[source] BackendError),

    #[error("planning request failed: {0}")]
    Backend(#[source] BackendError),

    #[error("the planner returned no response")]
    NoResponse,

    #[error("could not render the planning prompt: {0}")]
    Template(String),
}

/// Configuration for decomposition
#[derive(Debug, Clone)]
pub struct DecomposerConfig {
    /// Number of recent messages fetched when looking for the plan
    pub message_limit: usize,
    pub min_tasks: usize,
    pub max_tasks: usize,
}

impl Default for DecomposerConfig {
    fn default() -> Self {
        Self::from(&LoopConfig::default())
    }
}

impl From<&LoopConfig> for DecomposerConfig {
    fn from(config: &LoopConfig) -> Self {
        Self {
            message_limit: config.message_limit,
            min_tasks: config.min_tasks,
            max_tasks: config.max_tasks,
        }
    }
}

/// Decomposer asks the backend for a numbered plan and extracts its lines
#[derive(Clone)]
pub struct Decomposer {
    backend: Arc<dyn ExecutionBackend>,
    prompts: Arc<PromptLoader>,
    config: DecomposerConfig,
}

impl Decomposer {
    pub fn new(backend: Arc<dyn ExecutionBackend>, prompts: Arc<PromptLoader>, config: DecomposerConfig) -> Self {
        debug!(?config, "Decomposer::new: called");
        Self {
            backend,
            prompts,
            config,
        }
    }

    /// Break `prompt` into task descriptions
    ///
    /// The result may be empty when the planner answered without a numbered
    /// list; callers decide what that means.
    pub async fn decompose(&self, prompt: &str, model: Option<&ModelConfig>) -> Result<Vec<String>, DecomposeError> {
        debug!(prompt_len = prompt.len(), ?model, "decompose: called");

        let instruction = self
            .prompts
            .decompose(&DecomposeContext {
                prompt: prompt.to_string(),
                min_tasks: self.config.min_tasks,
                max_tasks: self.config.max_tasks,
            })
            .map_err(|e| DecomposeError::Template(e.to_string()))?;

        let session = self
            .backend
            .create_session()
            .await
            .map_err(DecomposeError::SessionCreation)?;
        debug!(%session, "decompose: planning session created");

        self.backend
            .prompt(&session, &instruction, model)
            .await
            .map_err(DecomposeError::Backend)?;

        let messages = self
            .backend
            .messages(&session, self.config.message_limit)
            .await
            .map_err(DecomposeError::Backend)?;

        let reply = latest_assistant(&messages).ok_or(DecomposeError::NoResponse)?;
        let tasks = parse_numbered_list(&reply.text());
        if tasks.is_empty() {
            warn!(%session, "Planner reply contained no numbered tasks");
        } else {
            info!(%session, count = tasks.len(), "Decomposed prompt into tasks");
        }
        Ok(tasks)
    }
}

/// Extract the text of every `N.` or `N)` line, in order
///
/// Lines that are not numbered are dropped, as are numbered lines whose text
/// is blank after trimming.
pub fn parse_numbered_list(text: &str) -> Vec<String> {
    debug!(text_len = text.len(), "parse_numbered_list: called");
    text.lines()
        .filter_map(|line| NUMBERED_LINE.captures(line))
        .filter_map(|caps| caps.get(2))
        .map(|m| m.as_str().trim().to_string())
        .filter(|task| !task.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::backend::{SessionId, SessionMessage};

    fn decomposer(backend: Arc<MockBackend>) -> Decomposer {
        Decomposer::new(
            backend,
            Arc::new(PromptLoader::embedded_only()),
            DecomposerConfig::default(),
        )
    }

    #[test]
    fn test_parse_mixed_markers_and_noise() {
        let tasks = parse_numbered_list("1. Do A\n2) Do B\nNotes: ignore this\n3. Do C");
        assert_eq!(tasks, vec!["Do A", "Do B", "Do C"]);
    }

    #[test]
    fn test_parse_drops_blank_captures() {
        let tasks = parse_numbered_list("1.    \n2. Real task\n3)\t \n");
        assert_eq!(tasks, vec!["Real task"]);
    }

    #[test]
    fn test_parse_indented_and_multi_digit() {
        let tasks = parse_numbered_list("Plan:\n  1. First\n  10) Tenth  \n- bullet");
        assert_eq!(tasks, vec!["First", "Tenth"]);
    }

    #[test]
    fn test_parse_no_list() {
        assert!(parse_numbered_list("I cannot help with that.").is_empty());
        assert!(parse_numbered_list("").is_empty());
    }

    #[test]
    fn test_parse_keeps_source_numbering_order() {
        let tasks = parse_numbered_list("3. Third\n1. First");
        assert_eq!(tasks, vec!["Third", "First"]);
    }

    #[tokio::test]
    async fn test_decompose_extracts_tasks() {
        let backend = Arc::new(MockBackend::new().with_planning_reply("Here you go:\n1. Scaffold\n2. Implement\n3. Test"));
        let tasks = decomposer(backend.clone()).decompose("build it", None).await.unwrap();
        assert_eq!(tasks, vec!["Scaffold", "Implement", "Test"]);

        let prompts = backend.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].text.contains("build it"));
        assert!(prompts[0].text.contains("numbered list"));
    }

    #[tokio::test]
    async fn test_decompose_passes_model() {
        let backend = Arc::new(MockBackend::new().with_planning_reply("1. A"));
        let model = ModelConfig::new("openai", "gpt-4o");
        decomposer(backend.clone()).decompose("p", Some(&model)).await.unwrap();
        assert_eq!(backend.prompts()[0].model, Some(model));
    }

    #[tokio::test]
    async fn test_decompose_empty_reply_is_ok_and_empty() {
        let backend = Arc::new(MockBackend::new().with_planning_reply("Sorry, no plan."));
        let tasks = decomposer(backend).decompose("p", None).await.unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_decompose_session_failure() {
        let backend = Arc::new(MockBackend::new().with_failing_sessions(vec![0]));
        let err = decomposer(backend).decompose("p", None).await.unwrap_err();
        assert!(matches!(err, DecomposeError::SessionCreation(_)));
    }

    #[tokio::test]
    async fn test_decompose_prompt_failure() {
        let backend = Arc::new(MockBackend::new().with_fail_marker("numbered list"));
        let err = decomposer(backend).decompose("p", None).await.unwrap_err();
        assert!(matches!(err, DecomposeError::Backend(_)));
    }

    /// Backend that accepts the prompt but never records an assistant reply
    struct SilentBackend;

    #[async_trait::async_trait]
    impl ExecutionBackend for SilentBackend {
        async fn create_session(&self) -> Result<SessionId, BackendError> {
            Ok(SessionId::new("ses_silent"))
        }

        async fn prompt(
            &self,
            _session: &SessionId,
            text: &str,
            _model: Option<&ModelConfig>,
        ) -> Result<SessionMessage, BackendError> {
            Ok(SessionMessage::user_text("msg_0", text))
        }

        async fn messages(&self, _session: &SessionId, _limit: usize) -> Result<Vec<SessionMessage>, BackendError> {
            Ok(vec![SessionMessage::user_text("msg_0", "plan please")])
        }
    }

    #[tokio::test]
    async fn test_decompose_no_assistant_reply() {
        let decomposer = Decomposer::new(
            Arc::new(SilentBackend),
            Arc::new(PromptLoader::embedded_only()),
            DecomposerConfig::default(),
        );
        let err = decomposer.decompose("p", None).await.unwrap_err();
        assert!(matches!(err, DecomposeError::NoResponse));
    }
}
