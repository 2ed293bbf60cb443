use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use quester_core::config::AppConfig;
use quester_core::error::QuesterError;
use quester_flow::{search_answer_flow, FlowContext};
use quester_llm::OpenAiClient;
use quester_search::TavilyClient;

#[derive(Parser)]
#[command(name = "quester", version, about = "Search-augmented question answering agent")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "quester.toml")]
    config: PathBuf,

    /// Override the configured search budget
    #[arg(long)]
    max_searches: Option<usize>,

    /// Print the search queries performed alongside the answer
    #[arg(long)]
    show_searches: bool,

    /// The question to answer (prompted interactively when omitted)
    #[arg(trailing_var_arg = true)]
    question: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "quester=info,quester_flow=info,quester_llm=info,quester_search=info,warn",
            )
        }))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // Load config
    let mut config = if cli.config.exists() {
        AppConfig::load(&cli.config)?
    } else {
        AppConfig::default()
    };

    // Credentials may come from the config file (with ${ENV} expansion) or
    // straight from the environment.
    if config.model.api_key.is_none() {
        config.model.api_key = std::env::var("OPENAI_API_KEY").ok();
    }
    let key_usable = config
        .model
        .api_key
        .as_deref()
        .is_some_and(|k| !k.trim().is_empty() && !k.starts_with("${"));
    if !key_usable {
        anyhow::bail!(
            "no API key for the reasoning model; set model.api_key in {} or export OPENAI_API_KEY",
            cli.config.display()
        );
    }

    if config.search.api_key.is_none() {
        config.search.api_key = std::env::var("TAVILY_API_KEY").ok();
    }
    if config.search.api_key.is_none() {
        warn!("No search API key configured; retrieval will degrade to placeholder results");
    }

    if let Some(n) = cli.max_searches {
        config.agent.max_searches = n;
    }

    let question = if cli.question.is_empty() {
        prompt_for_question()?
    } else {
        cli.question.join(" ")
    };
    let question = question.trim().to_string();
    if question.is_empty() {
        anyhow::bail!("please provide a question");
    }

    let llm = Arc::new(OpenAiClient::new(config.model.clone()));
    let mut search_client = TavilyClient::new(config.search.api_key.clone().unwrap_or_default());
    if let Some(url) = &config.search.base_url {
        search_client = search_client.with_base_url(url);
    }
    let search = Arc::new(search_client);

    let flow = search_answer_flow(llm, search, &config);
    let mut ctx = FlowContext::new(question.as_str());

    info!(%question, max_searches = config.agent.max_searches, "Starting run");

    tokio::select! {
        res = flow.run(&mut ctx) => res?,
        _ = tokio::signal::ctrl_c() => {
            // Partial context state is discarded, never persisted.
            return Err(QuesterError::Cancelled.into());
        }
    }

    println!();
    println!("{}", "=".repeat(50));
    if ctx.search_count() > 0 {
        println!("Searches performed: {}", ctx.search_count());
        if cli.show_searches {
            for (i, record) in ctx.search_history().iter().enumerate() {
                println!("  {}. {}", i + 1, record.query);
            }
        }
    }

    match ctx.final_answer() {
        Some(answer) => {
            println!("\n{answer}");
            Ok(())
        }
        None => anyhow::bail!("no final answer was produced"),
    }
}

fn prompt_for_question() -> anyhow::Result<String> {
    print!("Enter your question: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
