//! Model resolution
//!
//! Decides which provider/model a loop runs with: an explicit
//! `provider/model` string, else the model last used in a context session,
//! else the process default. Resolution never fails.

use std::future::Future;

use tracing::debug;

use crate::backend::{BackendError, ExecutionBackend, SessionId, latest_assistant};
use crate::domain::ModelConfig;

/// Picks the model for a loop
#[derive(Debug, Clone)]
pub struct ModelResolver {
    default: ModelConfig,
}

impl ModelResolver {
    pub fn new(default: ModelConfig) -> Self {
        debug!(%default, "ModelResolver::new: called");
        Self { default }
    }

    pub fn default_model(&self) -> &ModelConfig {
        &self.default
    }

    /// Resolve the model to use
    ///
    /// A malformed `explicit` string falls back to the default without
    /// consulting `lookup`. With no `explicit`, `lookup` is awaited; its
    /// error is logged and discarded.
    pub async fn resolve<F, Fut>(&self, explicit: Option<&str>, lookup: F) -> ModelConfig
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<ModelConfig>, BackendError>>,
    {
        debug!(?explicit, "resolve: called");
        if let Some(raw) = explicit {
            return match ModelConfig::parse(raw) {
                Some(model) => {
                    debug!(%model, "resolve: using explicit model");
                    model
                }
                None => {
                    debug!(%raw, "resolve: malformed explicit model, using default");
                    self.default.clone()
                }
            };
        }

        match lookup().await {
            Ok(Some(model)) => {
                debug!(%model, "resolve: using contextual model");
                model
            }
            Ok(None) => {
                debug!("resolve: no contextual model, using default");
                self.default.clone()
            }
            Err(e) => {
                debug!(error = %e, "resolve: contextual lookup failed, using default");
                self.default.clone()
            }
        }
    }
}

/// Model of the most recent assistant message in `session`
pub async fn lookup_from_session(
    backend: &dyn ExecutionBackend,
    session: &SessionId,
    limit: usize,
) -> Result<Option<ModelConfig>, BackendError> {
    debug!(%session, %limit, "lookup_from_session: called");
    let messages = backend.messages(session, limit).await?;
    Ok(latest_assistant(&messages).and_then(|m| m.model.clone()))
}
