//! taskloop configuration types and loading

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::ModelConfig;

/// Main taskloop configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Execution backend connection
    pub backend: BackendConfig,

    /// Process-wide default model
    pub model: ModelDefaults,

    /// Loop and planning settings
    #[serde(rename = "loop")]
    pub loop_config: LoopConfig,

    /// Prompt template overrides
    pub prompts: PromptsConfig,

    /// Log level used when none is given on the command line
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(eyre!("backend.base-url must not be empty"));
        }
        if self.model.provider.is_empty() || self.model.model.is_empty() {
            return Err(eyre!("model.provider and model.model must both be set"));
        }
        let lc = &self.loop_config;
        if lc.message_limit == 0 {
            return Err(eyre!("loop.message-limit must be at least 1"));
        }
        if lc.min_tasks == 0 || lc.min_tasks > lc.max_tasks {
            return Err(eyre!(
                "loop.min-tasks ({}) must be at least 1 and no more than loop.max-tasks ({})",
                lc.min_tasks,
                lc.max_tasks
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .taskloop.yml
        let local_config = PathBuf::from(".taskloop.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/taskloop/taskloop.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("taskloop").join("taskloop.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        tracing::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }
}

/// Execution backend connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Working directory the backend should scope sessions to
    pub directory: Option<String>,

    /// Timeout for session creation and message reads
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Timeout for a task prompt; unset means wait indefinitely
    #[serde(rename = "prompt-timeout-ms")]
    pub prompt_timeout_ms: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:4096".to_string(),
            directory: None,
            timeout_ms: 60_000,
            prompt_timeout_ms: None,
        }
    }
}

/// Process-wide default model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDefaults {
    pub provider: String,
    pub model: String,
}

impl ModelDefaults {
    pub fn to_model_config(&self) -> ModelConfig {
        ModelConfig::new(&self.provider, &self.model)
    }
}

impl Default for ModelDefaults {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
        }
    }
}

/// Loop and planning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Recent messages fetched when reading a session back
    #[serde(rename = "message-limit")]
    pub message_limit: usize,

    /// Lower bound on tasks requested from the planner
    #[serde(rename = "min-tasks")]
    pub min_tasks: usize,

    /// Upper bound on tasks requested from the planner
    #[serde(rename = "max-tasks")]
    pub max_tasks: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            message_limit: 10,
            min_tasks: 3,
            max_tasks: 8,
        }
    }
}

/// Prompt template overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory checked for `{name}.pmt` before the embedded prompts
    pub dir: PathBuf,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".taskloop/prompts"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.backend.base_url, "http://127.0.0.1:4096");
        assert_eq!(config.backend.timeout_ms, 60_000);
        assert!(config.backend.prompt_timeout_ms.is_none());
        assert_eq!(config.model.provider, "anthropic");
        assert_eq!(config.loop_config.message_limit, 10);
        assert_eq!(config.loop_config.min_tasks, 3);
        assert_eq!(config.loop_config.max_tasks, 8);
        assert_eq!(config.prompts.dir, PathBuf::from(".taskloop/prompts"));
        assert!(config.log_level.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_model_defaults_to_model_config() {
        let model = ModelDefaults::default().to_model_config();
        assert_eq!(model.provider_id, "anthropic");
        assert_eq!(model.model_id, "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
backend:
  base-url: http://10.0.0.5:4096
  directory: /work/repo
  timeout-ms: 5000
  prompt-timeout-ms: 900000

model:
  provider: openai
  model: gpt-4o

loop:
  message-limit: 20
  min-tasks: 2
  max-tasks: 5

prompts:
  dir: /etc/taskloop/prompts

log-level: debug
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.backend.base_url, "http://10.0.0.5:4096");
        assert_eq!(config.backend.directory.as_deref(), Some("/work/repo"));
        assert_eq!(config.backend.timeout_ms, 5000);
        assert_eq!(config.backend.prompt_timeout_ms, Some(900_000));
        assert_eq!(config.model.to_model_config(), ModelConfig::new("openai", "gpt-4o"));
        assert_eq!(config.loop_config.message_limit, 20);
        assert_eq!(config.loop_config.min_tasks, 2);
        assert_eq!(config.loop_config.max_tasks, 5);
        assert_eq!(config.prompts.dir, PathBuf::from("/etc/taskloop/prompts"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
model:
  model: claude-opus-4
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.model.model, "claude-opus-4");

        // Defaults for unspecified
        assert_eq!(config.model.provider, "anthropic");
        assert_eq!(config.backend.base_url, "http://127.0.0.1:4096");
        assert_eq!(config.loop_config.max_tasks, 8);
    }

    #[test]
    fn test_validate_rejects_inverted_task_bounds() {
        let mut config = Config::default();
        config.loop_config.min_tasks = 9;
        assert!(config.validate().is_err());

        config.loop_config.min_tasks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("taskloop.yml");
        fs::write(&path, "backend:\n  base-url: http://example:1234\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.backend.base_url, "http://example:1234");
        assert_eq!(config.backend.timeout_ms, 60_000);
    }

    #[test]
    fn test_load_explicit_path_missing_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.yml");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to load config"));
    }

    #[test]
    fn test_load_explicit_path_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yml");
        fs::write(&path, "loop:\n  message-limit: 0\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
