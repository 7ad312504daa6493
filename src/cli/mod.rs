//! CLI module for Stormline
//!
//! Operator commands over the AI routing layer:
//! - `chat`: routed chat, optionally streamed or grounded in a customer file
//! - `research` / `classify` / `parse`: task-specific helpers
//! - `analyze`: roof damage analysis for a photo
//! - `routes`: task table, registered models, and credential status

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stormline_ai::AiTask;

pub mod analyze;
pub mod ask;
pub mod routes;

/// Stormline AI CLI
#[derive(Parser, Debug)]
#[command(name = "stormline")]
#[command(about = "AI provider routing for storm-restoration workflows")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a prompt through the router
    Chat {
        /// User prompt
        prompt: String,
        /// Task used to pick the model (chat, tool_call, summarize, ...)
        #[arg(long, default_value = "chat")]
        task: AiTask,
        /// Print deltas as they arrive
        #[arg(long)]
        stream: bool,
        /// Extra system instruction
        #[arg(long)]
        system: Option<String>,
        /// Customer context JSON file rendered into the system prompt
        #[arg(long)]
        customer: Option<PathBuf>,
    },
    /// Web research with citations
    Research {
        /// Research question
        query: String,
        /// Background for the researcher
        #[arg(long)]
        context: Option<String>,
        /// Restrict sources to day, week, month, or year
        #[arg(long, value_parser = ask::parse_recency)]
        recency: Option<stormline_ai::SearchRecency>,
    },
    /// Score text against categories
    Classify {
        /// Text to classify
        text: String,
        /// Allowed category (repeatable)
        #[arg(long = "category", short = 'c', required = true)]
        categories: Vec<String>,
        /// Extra instructions for the classifier
        #[arg(long)]
        instructions: Option<String>,
    },
    /// Extract JSON matching a schema
    Parse {
        /// Text to extract from
        text: String,
        /// JSON schema, inline or `@path/to/schema.json`
        #[arg(long)]
        schema: String,
        /// Extra instructions for the extractor
        #[arg(long)]
        instructions: Option<String>,
    },
    /// Analyze a roof or exterior photo for damage
    Analyze {
        /// Image URL or local file path
        image: String,
        /// Storm or claim background for the analyst
        #[arg(long)]
        context: Option<String>,
        /// Print the full JSON report instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Show the routing table and which models are available
    Routes,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let config = crate::settings::load_config()?;

    match command {
        Commands::Chat {
            prompt,
            task,
            stream,
            system,
            customer,
        } => {
            let router = ask::router(&config)?;
            ask::chat(&router, ask::ChatArgs { prompt, task, stream, system, customer }).await
        }
        Commands::Research { query, context, recency } => {
            let router = ask::router(&config)?;
            ask::research(&router, query, context, recency).await
        }
        Commands::Classify {
            text,
            categories,
            instructions,
        } => {
            let router = ask::router(&config)?;
            ask::classify(&router, text, categories, instructions).await
        }
        Commands::Parse {
            text,
            schema,
            instructions,
        } => {
            let router = ask::router(&config)?;
            ask::parse(&router, text, &schema, instructions).await
        }
        Commands::Analyze { image, context, json } => {
            analyze::run(&config, &image, context.as_deref(), json).await
        }
        Commands::Routes => routes::run(&config),
    }
}
