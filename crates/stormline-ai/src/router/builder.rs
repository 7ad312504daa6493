//! Router bootstrap
//!
//! Builds one adapter per routed model whose provider credential is present.
//! A missing credential skips that family; it never fails startup.

use super::config::RouterConfig;
use super::provider::ProviderAdapter;
use super::router_impl::AiRouter;
use super::table::{provider_for_model, RouteTable};
use super::types::ProviderKind;
use crate::error::Result;
use crate::providers::anthropic::{AnthropicConfig, AnthropicProvider};
use crate::providers::gemini::{GeminiConfig, GeminiProvider};
use crate::providers::moonshot::{MoonshotConfig, MoonshotProvider};
use crate::providers::openai::{OpenAiConfig, OpenAiProvider};
use crate::providers::perplexity::{PerplexityConfig, PerplexityProvider};
use crate::providers::transport::build_client;
use reqwest::Client;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Assembles an [`AiRouter`] from explicit adapters or the environment
pub struct RouterBuilder {
    config: RouterConfig,
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl RouterBuilder {
    /// Start a builder
    #[must_use]
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            adapters: Vec::new(),
        }
    }

    /// Add an adapter
    #[must_use]
    pub fn adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Build the router
    #[must_use]
    pub fn build(self) -> AiRouter {
        let mut router = AiRouter::new(self.config);
        for adapter in self.adapters {
            router.register_adapter(adapter);
        }
        router
    }

    /// Register adapters for every routed model plus the fallback model,
    /// using whichever provider credentials are set in the environment.
    pub fn from_env(config: RouterConfig) -> Result<AiRouter> {
        let client = build_client()?;
        let timeout = config.timeout();
        let routes = RouteTable::with_overrides(&config.task_models);

        let models: BTreeSet<&str> = routes
            .iter()
            .map(|(_, model)| model)
            .chain(std::iter::once(config.fallback_model.as_str()))
            .collect();

        let mut adapters = Vec::new();
        for model in models {
            let Some(family) = provider_for_model(model) else {
                debug!(model = %model, "No provider family for model, skipping");
                continue;
            };
            match env_adapter(family, model, &client, timeout) {
                Some(adapter) => adapters.push(adapter),
                None => debug!(
                    model = %model,
                    provider = %family,
                    env = family.api_key_env(),
                    "Provider credential not set, skipping"
                ),
            }
        }

        let mut builder = Self::new(config);
        for adapter in adapters {
            builder = builder.adapter(adapter);
        }
        let router = builder.build();

        info!(
            models = ?router.registered_models(),
            fallback = %router.fallback_model(),
            fallback_registered = router.has_adapter(router.fallback_model()),
            "AI router initialized"
        );
        Ok(router)
    }
}

fn env_adapter(
    family: ProviderKind,
    model: &str,
    client: &Client,
    timeout: Option<Duration>,
) -> Option<Arc<dyn ProviderAdapter>> {
    let client = client.clone();
    let adapter: Arc<dyn ProviderAdapter> = match family {
        ProviderKind::Anthropic => {
            let mut config = AnthropicConfig::from_env().ok()?.with_model(model);
            if let Some(timeout) = timeout {
                config = config.with_timeout(timeout);
            }
            Arc::new(AnthropicProvider::with_client(client, config))
        }
        ProviderKind::OpenAi => {
            let mut config = OpenAiConfig::from_env().ok()?.with_model(model);
            if let Some(timeout) = timeout {
                config = config.with_timeout(timeout);
            }
            Arc::new(OpenAiProvider::with_client(client, config))
        }
        ProviderKind::Moonshot => {
            let mut config = MoonshotConfig::from_env().ok()?.with_model(model);
            if let Some(timeout) = timeout {
                config = config.with_timeout(timeout);
            }
            Arc::new(MoonshotProvider::with_client(client, config))
        }
        ProviderKind::Gemini => {
            let mut config = GeminiConfig::from_env().ok()?.with_model(model);
            if let Some(timeout) = timeout {
                config = config.with_timeout(timeout);
            }
            Arc::new(GeminiProvider::with_client(client, config))
        }
        ProviderKind::Perplexity => {
            let mut config = PerplexityConfig::from_env().ok()?.with_model(model);
            if let Some(timeout) = timeout {
                config = config.with_timeout(timeout);
            }
            Arc::new(PerplexityProvider::with_client(client, config))
        }
    };
    Some(adapter)
}
