//! Model selection

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Provider and model pair sent with every task prompt
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(rename = "providerID")]
    pub provider_id: String,

    #[serde(rename = "modelID")]
    pub model_id: String,
}

impl ModelConfig {
    pub fn new(provider_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.into(),
        }
    }

    /// Parse a `provider/model` string
    ///
    /// Splits on the first `/` only, so `openrouter/anthropic/claude` yields
    /// provider `openrouter` and model `anthropic/claude`. Returns None when
    /// there is no `/` or either side is empty.
    pub fn parse(raw: &str) -> Option<Self> {
        debug!(%raw, "ModelConfig::parse: called");
        let raw = raw.trim();
        let (provider, model) = raw.split_once('/')?;
        if provider.is_empty() || model.is_empty() {
            debug!("ModelConfig::parse: empty provider or model");
            return None;
        }
        Some(Self::new(provider, model))
    }
}

impl std::fmt::Display for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider_id, self.model_id)
    }
}
