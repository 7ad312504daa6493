//! Routed chat, research, classification, and parsing commands

use crate::settings::AppConfig;
use anyhow::{Context, Result};
use futures::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use stormline_ai::{
    AiRouter, AiTask, ChatRequest, ClassifyRequest, CustomerContext, Message, ParseRequest,
    ResearchRequest, RouterBuilder, SearchRecency,
};
use tracing::{debug, warn};

pub struct ChatArgs {
    pub prompt: String,
    pub task: AiTask,
    pub stream: bool,
    pub system: Option<String>,
    pub customer: Option<PathBuf>,
}

/// Build the router once from configuration and provider credentials
pub fn router(config: &AppConfig) -> Result<AiRouter> {
    let router = RouterBuilder::from_env(config.router.clone())
        .context("Failed to initialize AI router")?;
    if router.registered_models().is_empty() {
        warn!("No provider API keys found. Set ANTHROPIC_API_KEY, OPENAI_API_KEY, or another provider key.");
    }
    Ok(router)
}

pub fn parse_recency(value: &str) -> std::result::Result<SearchRecency, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "day" => Ok(SearchRecency::Day),
        "week" => Ok(SearchRecency::Week),
        "month" => Ok(SearchRecency::Month),
        "year" => Ok(SearchRecency::Year),
        other => Err(format!("unknown recency '{other}' (day, week, month, year)")),
    }
}

pub async fn chat(router: &AiRouter, args: ChatArgs) -> Result<()> {
    let mut messages = Vec::new();
    if let Some(system) = args.system {
        messages.push(Message::system(system));
    }
    messages.push(Message::user(args.prompt));

    if let Some(path) = args.customer {
        let context = load_customer(&path)?;
        let response = router
            .chat_with_context(messages, &context, args.task)
            .await
            .context("Chat request failed")?;
        println!("{}", response.content());
        return Ok(());
    }

    let request = ChatRequest::new(messages).with_task(args.task);

    if args.stream {
        let mut stream = router.chat_stream(request).context("Streaming unavailable")?;
        let mut stdout = std::io::stdout();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Stream failed")?;
            write!(stdout, "{}", chunk.delta)?;
            stdout.flush()?;
            if let Some(reason) = chunk.finish_reason {
                debug!(finish_reason = reason.as_str(), "Stream finished");
            }
        }
        println!();
        return Ok(());
    }

    let response = router.chat(request).await.context("Chat request failed")?;
    println!("{}", response.content());
    for call in response.tool_calls() {
        println!("→ {}({})", call.name, call.arguments_json());
    }
    debug!(
        model = %response.model,
        tokens = response.usage.total_tokens,
        finish_reason = response.finish_reason.as_str(),
        "Chat complete"
    );
    Ok(())
}

pub async fn research(
    router: &AiRouter,
    query: String,
    context: Option<String>,
    recency: Option<SearchRecency>,
) -> Result<()> {
    let mut request = ResearchRequest::new(query);
    if let Some(context) = context {
        request = request.with_context(context);
    }
    if let Some(recency) = recency {
        request = request.with_recency(recency);
    }

    let result = router.research(request).await.context("Research failed")?;
    println!("{}", result.answer);
    if !result.citations.is_empty() {
        println!("\nSources:");
        for (i, citation) in result.citations.iter().enumerate() {
            println!("  [{}] {} - {}", i + 1, citation.title, citation.url);
        }
    }
    Ok(())
}

pub async fn classify(
    router: &AiRouter,
    text: String,
    categories: Vec<String>,
    instructions: Option<String>,
) -> Result<()> {
    let mut request = ClassifyRequest::new(text, categories);
    request.instructions = instructions;

    let result = router.classify(request).await.context("Classification failed")?;
    for score in &result.categories {
        println!("{:<20} {:.2}", score.label, score.confidence);
    }
    Ok(())
}

pub async fn parse(
    router: &AiRouter,
    text: String,
    schema: &str,
    instructions: Option<String>,
) -> Result<()> {
    let schema = load_schema(schema)?;
    let mut request = ParseRequest::new(text, schema);
    request.instructions = instructions;

    let result = router.parse(request).await.context("Parse failed")?;
    println!("{}", serde_json::to_string_pretty(&result.data)?);
    println!("confidence: {:.2}", result.confidence);
    Ok(())
}

fn load_customer(path: &Path) -> Result<CustomerContext> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read customer file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid customer context in {}", path.display()))
}

/// Inline JSON, or `@file` to read it from disk
fn load_schema(value: &str) -> Result<serde_json::Value> {
    let text = match value.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file {path}"))?,
        None => value.to_string(),
    };
    serde_json::from_str(&text).context("Schema is not valid JSON")
}
