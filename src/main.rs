use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::level_filters::LevelFilter;

use topicbook::anthropic::AnthropicClient;
use topicbook::cli::{Cli, Command};
use topicbook::config::TopicbookConfig;
use topicbook::enrichment::{Enricher, EnrichmentPrompts, LlmEnricher};
use topicbook::generator::{Generator, LlmGenerator, Prompts};
use topicbook::runner::{RunCoordinator, RunPaths};
use topicbook::topics::{Topic, read_topics};
use topicbook::tracking::{ProcessingHistory, ResultsSnapshot, SystemClock};
use topicbook::ui;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = TopicbookConfig::load()?;
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }

    match &cli.command {
        Command::Run { topics, .. } => {
            let topics_path = topics.clone().unwrap_or_else(|| config.topics_file.clone());
            run(&config, &topics_path, &cli.command).await
        }
        Command::Status => {
            let snapshot = ResultsSnapshot::load(&config.results_path())?;
            ui::print_snapshot(&snapshot);
            Ok(())
        }
        Command::History { topic, limit } => {
            let events = ProcessingHistory::new().read(&config.history_path())?;
            ui::print_history(&ui::filter_events(&events, topic.as_deref(), *limit));
            Ok(())
        }
    }
}

async fn run(config: &TopicbookConfig, topics_path: &std::path::Path, command: &Command) -> Result<()> {
    if config.api_key.is_empty() {
        bail!("no API key: set ANTHROPIC_API_KEY or api_key in topicbook.toml");
    }

    let topics = read_topics(topics_path)?;
    if topics.is_empty() {
        println!("No topics in {}", topics_path.display());
        return Ok(());
    }
    let prompts = Prompts::load(&config.prompts_dir)?;
    let client = AnthropicClient::new(config.api_key.clone(), Duration::from_secs(config.timeout_secs))
        .context("failed to build HTTP client")?;
    let generator = LlmGenerator::new(
        client,
        prompts,
        config.model.clone(),
        config.max_tokens,
        config.retry(),
    );

    let paths = RunPaths {
        output_dir: config.output_dir.clone(),
        results: config.results_path(),
        history: config.history_path(),
    };
    let coordinator = RunCoordinator::new(generator, paths, command.selection());

    if !config.enrichment_enabled() {
        tracing::info!("no enrichment key, critique and code examples are skipped");
        return drive(coordinator, &topics).await;
    }
    let enrichment_prompts = EnrichmentPrompts::load(&config.prompts_dir)?;
    let enrichment_client = AnthropicClient::new(
        config.enrichment_api_key.clone(),
        Duration::from_secs(config.enrichment_timeout_secs),
    )
    .context("failed to build enrichment HTTP client")?;
    let enricher = LlmEnricher::new(
        enrichment_client,
        enrichment_prompts,
        config.enrichment_model.clone(),
        config.enrichment_max_tokens,
        config.retry(),
    );
    drive(coordinator.with_enricher(enricher), &topics).await
}

async fn drive<G: Generator, E: Enricher>(coordinator: RunCoordinator<G, SystemClock, E>, topics: &[Topic]) -> Result<()> {
    let progress = ui::RunProgress::start();
    let result = coordinator.run(topics, &progress).await;
    progress.finish();
    let summary = result?;

    ui::print_summary(&summary);
    if !summary.is_clean() {
        bail!("run finished but not every outcome was persisted");
    }
    Ok(())
}
