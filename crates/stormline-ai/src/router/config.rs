//! Router configuration

use super::types::AiTask;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Model used when a task's preferred model has no adapter
pub const DEFAULT_FALLBACK_MODEL: &str = "gpt-4o";

/// Router configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Model whose adapter serves tasks with no registered preferred model
    pub fallback_model: String,
    /// Per-adapter timeout override in seconds (adapter defaults when unset)
    pub timeout_secs: Option<u64>,
    /// Task → model overrides applied on top of the built-in route table
    pub task_models: HashMap<AiTask, String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            fallback_model: DEFAULT_FALLBACK_MODEL.to_string(),
            timeout_secs: None,
            task_models: HashMap::new(),
        }
    }
}

impl RouterConfig {
    /// Set the fallback model
    #[must_use]
    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    /// Route a task to a specific model
    #[must_use]
    pub fn with_task_model(mut self, task: AiTask, model: impl Into<String>) -> Self {
        self.task_models.insert(task, model.into());
        self
    }

    /// Set the adapter timeout override
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Timeout override as a duration
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
