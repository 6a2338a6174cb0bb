use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sift_core::{CleanReport, Conversation, ConversationProcessor, SiftConfig};
use sift_providers::Providers;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Built-in conversation used by `sift demo`
const DEMO_CONVERSATION: &str = include_str!("../fixtures/ecommerce.json");

/// Sift - clean growing conversations down to what matters
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pipeline configuration file (TOML)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Minimum similarity for keeping a tool chunk
    #[arg(long, global = true)]
    threshold: Option<f32>,

    /// Character budget for the overarching context
    #[arg(long, global = true)]
    max_context_chars: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a conversation JSON file
    ///
    /// Cleaning user messages needs GROQ_API_KEY (or API_KEY_GROQ). A fully
    /// processed conversation is written back without contacting any provider.
    Clean {
        /// Conversation file: a JSON array of {role, message, processed}
        input: PathBuf,

        /// Write the cleaned conversation here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print JSON instead of `role: message` lines
        #[arg(long)]
        json: bool,
    },

    /// Clean the built-in e-commerce conversation and print before and after
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Clean {
            input,
            output,
            json,
        } => {
            let mut conversation = load_conversation(&input)?;
            let report = clean_pending(&mut conversation, config, Providers::from_env)
                .await
                .with_context(|| format!("Failed to clean {}", input.display()))?;
            match report {
                Some(report) => tracing::info!(
                    cleaned = report.cleaned.len(),
                    task_cleaned = report.task_cleaned,
                    "Cleaned {}",
                    input.display()
                ),
                None => tracing::info!("{} is already fully processed", input.display()),
            }

            match output {
                Some(path) => {
                    let content = serde_json::to_string_pretty(&conversation)?;
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Cleaned conversation written to {}", path.display());
                }
                None if json => println!("{}", serde_json::to_string_pretty(&conversation)?),
                None => print!("{}", conversation.render()),
            }
        }
        Commands::Demo => {
            let processor = build_processor(config, Providers::from_env()?)?;
            let conversation = demo_conversation()?;
            print!("{}", conversation.render());

            let cleaned = processor.clean_conversation(&conversation).await?;
            println!("Cleaned conversation:");
            print!("{}", cleaned.render());
        }
    }

    Ok(())
}

fn build_processor(config: SiftConfig, providers: Providers) -> Result<ConversationProcessor> {
    let processor = ConversationProcessor::with_config(providers.embedder, providers.cleaner, config)?;
    tracing::debug!(
        threshold = processor.config().score_threshold,
        max_context_chars = processor.config().max_context_chars,
        "Processor ready"
    );
    Ok(processor)
}

/// Clean `conversation` in place, building providers only if an entry is pending
///
/// Returns `None` when nothing needed cleaning.
async fn clean_pending<F>(
    conversation: &mut Conversation,
    config: SiftConfig,
    providers: F,
) -> Result<Option<CleanReport>>
where
    F: FnOnce() -> Result<Providers>,
{
    if conversation.is_fully_processed() {
        return Ok(None);
    }

    let providers = providers().context("Failed to configure providers")?;
    let processor = build_processor(config, providers)?;
    let report = processor.clean_in_place(conversation).await?;
    Ok(Some(report))
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<SiftConfig> {
    let mut config = match &cli.config {
        Some(path) => SiftConfig::from_file(path)?,
        None => SiftConfig::default(),
    };

    if let Some(threshold) = cli.threshold {
        config = config.with_score_threshold(threshold);
    }
    if let Some(max_chars) = cli.max_context_chars {
        config = config.with_max_context_chars(max_chars);
    }

    config.validate()?;
    Ok(config)
}

fn load_conversation(path: &Path) -> Result<Conversation> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let conversation = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a conversation JSON array", path.display()))?;
    Ok(conversation)
}

fn demo_conversation() -> Result<Conversation> {
    serde_json::from_str(DEMO_CONVERSATION).context("Built-in demo conversation is malformed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sift_core::{ConversationEntry, Embedding, EmbeddingClient, MessageCleaner, Role, ServiceError};
    use std::io::Write;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Echo;

    #[async_trait]
    impl EmbeddingClient for Echo {
        async fn embed(&self, _text: &str) -> std::result::Result<Embedding, ServiceError> {
            Ok(vec![1.0, 0.0])
        }
    }

    #[async_trait]
    impl MessageCleaner for Echo {
        async fn clean(&self, text: &str) -> std::result::Result<String, ServiceError> {
            Ok(text.to_string())
        }
    }

    fn echo_providers() -> Result<Providers> {
        Ok(Providers {
            embedder: Arc::new(Echo),
            cleaner: Arc::new(Echo),
        })
    }

    #[tokio::test]
    async fn test_processed_conversation_needs_no_providers() {
        let mut conversation = Conversation::from(vec![
            ConversationEntry::processed(Role::User, "Build a shop"),
            ConversationEntry::processed(Role::Tool, "Stripe docs"),
        ]);
        let before = conversation.clone();

        let report = clean_pending(&mut conversation, SiftConfig::default(), || {
            Err(anyhow::anyhow!("GROQ_API_KEY is not set"))
        })
        .await
        .unwrap();

        assert!(report.is_none());
        assert_eq!(conversation, before);
    }

    #[tokio::test]
    async fn test_pending_conversation_reports_missing_key() {
        let mut conversation = Conversation::from(vec![ConversationEntry::user("Build a shop")]);

        let err = clean_pending(&mut conversation, SiftConfig::default(), || {
            Err(anyhow::anyhow!("GROQ_API_KEY is not set"))
        })
        .await
        .unwrap_err();

        assert!(format!("{err:#}").contains("GROQ_API_KEY"));
        assert!(!conversation.is_fully_processed());
    }

    #[tokio::test]
    async fn test_pending_conversation_is_cleaned() {
        let mut conversation = Conversation::from(vec![
            ConversationEntry::user("Build a shop"),
            ConversationEntry::ai("Sure"),
        ]);

        let report = clean_pending(&mut conversation, SiftConfig::default(), echo_providers)
            .await
            .unwrap()
            .unwrap();

        assert!(report.task_cleaned);
        assert!(conversation.is_fully_processed());
    }

    #[test]
    fn test_demo_conversation_parses() {
        let conversation = demo_conversation().unwrap();

        assert_eq!(conversation.len(), 26);
        assert_eq!(conversation.original_task_index(), Some(0));
        assert_eq!(conversation[3].role, Role::Tool);
        assert!(conversation.iter().all(|e| !e.processed));
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "sift",
            "--threshold",
            "0.5",
            "--max-context-chars",
            "1024",
            "demo",
        ]);
        let config = load_config(&cli).unwrap();

        assert_eq!(config.score_threshold, 0.5);
        assert_eq!(config.max_context_chars, 1024);
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let cli = Cli::parse_from(["sift", "demo", "--threshold", "3.0"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn test_clean_arguments() {
        let cli = Cli::parse_from(["sift", "clean", "chat.json", "--json", "-v"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Clean { input, output, json } => {
                assert_eq!(input, PathBuf::from("chat.json"));
                assert!(output.is_none());
                assert!(json);
            }
            Commands::Demo => panic!("expected clean"),
        }
    }

    #[test]
    fn test_load_conversation_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"role": "user", "message": "hi", "processed": true}}, {{"role": "tool", "message": "out"}}]"#
        )
        .unwrap();

        let conversation = load_conversation(file.path()).unwrap();
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.unprocessed_boundary(), 1);
    }

    #[test]
    fn test_load_conversation_rejects_objects() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"role": "user"}}"#).unwrap();

        let err = load_conversation(file.path()).unwrap_err();
        assert!(err.to_string().contains("not a conversation JSON array"));
    }
}
