//! Static task → model table

use super::types::{AiTask, ProviderKind};
use std::collections::HashMap;

/// Preferred model per task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: HashMap<AiTask, String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        let routes = AiTask::ALL
            .into_iter()
            .map(|task| (task, Self::builtin(task).to_string()))
            .collect();
        Self { routes }
    }
}

impl RouteTable {
    /// Built-in preferred model for a task
    #[must_use]
    pub fn builtin(task: AiTask) -> &'static str {
        match task {
            AiTask::Chat => "claude-sonnet-4-5",
            AiTask::ToolCall => "gpt-4o",
            AiTask::SimpleTool => "gpt-4o-mini",
            AiTask::Research => "sonar-pro",
            AiTask::Classify | AiTask::Parse => "gemini-2.5-flash",
            AiTask::Summarize => "kimi-k2-0905-preview",
        }
    }

    /// Built-in table with per-task overrides applied
    #[must_use]
    pub fn with_overrides(overrides: &HashMap<AiTask, String>) -> Self {
        let mut table = Self::default();
        for (task, model) in overrides {
            let model = model.trim();
            if !model.is_empty() {
                table.routes.insert(*task, model.to_string());
            }
        }
        table
    }

    /// Preferred model for a task
    #[must_use]
    pub fn model_for(&self, task: AiTask) -> &str {
        self.routes
            .get(&task)
            .map_or_else(|| Self::builtin(task), String::as_str)
    }

    /// `(task, model)` pairs in task declaration order
    pub fn iter(&self) -> impl Iterator<Item = (AiTask, &str)> + '_ {
        AiTask::ALL
            .into_iter()
            .map(move |task| (task, self.model_for(task)))
    }
}

/// Wire-protocol family serving a model identifier, by naming convention
#[must_use]
pub fn provider_for_model(model: &str) -> Option<ProviderKind> {
    let model = model.trim().to_ascii_lowercase();
    let family = if model.starts_with("claude") {
        ProviderKind::Anthropic
    } else if model.starts_with("gpt-")
        || model.starts_with("chatgpt")
        || ["o1", "o3", "o4"]
            .iter()
            .any(|p| model == *p || model.starts_with(&format!("{p}-")))
    {
        ProviderKind::OpenAi
    } else if model.starts_with("kimi") || model.starts_with("moonshot") {
        ProviderKind::Moonshot
    } else if model.starts_with("gemini") {
        ProviderKind::Gemini
    } else if model.starts_with("sonar") {
        ProviderKind::Perplexity
    } else {
        return None;
    };
    Some(family)
}
