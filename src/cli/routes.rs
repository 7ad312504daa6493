//! Routing table and credential report

use crate::settings::AppConfig;
use anyhow::{Context, Result};
use stormline_ai::router::provider_for_model;
use stormline_ai::{AiRouter, RouterBuilder};

pub fn run(config: &AppConfig) -> Result<()> {
    let router =
        RouterBuilder::from_env(config.router.clone()).context("Failed to initialize AI router")?;
    print!("{}", render(&router));
    Ok(())
}

fn render(router: &AiRouter) -> String {
    let mut out = String::from("🧭 Stormline routes\n\n");

    for (task, model) in router.routes().iter() {
        let provider = provider_for_model(model).map_or("unknown", |p| p.as_str());
        let status = if router.has_adapter(model) {
            "✅".to_string()
        } else if router.has_adapter(router.fallback_model()) {
            format!("↪ {}", router.fallback_model())
        } else {
            "❌ unavailable".to_string()
        };
        out.push_str(&format!("  {:<12} {:<24} {:<11} {}\n", task.as_str(), model, provider, status));
    }

    out.push_str(&format!("\nFallback: {}", router.fallback_model()));
    if !router.has_adapter(router.fallback_model()) {
        out.push_str(" (not registered)");
    }
    out.push('\n');

    let models = router.registered_models();
    if models.is_empty() {
        out.push_str("Registered: none. Set a provider API key such as OPENAI_API_KEY.\n");
    } else {
        out.push_str(&format!("Registered: {}\n", models.join(", ")));
    }
    out
}
