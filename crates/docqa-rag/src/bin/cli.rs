//! Command-line front end: ingest a folder, chat in the terminal, or inspect retrieval
//!
//! Run with: cargo run -p docqa-rag --features cli --bin docqa-rag -- <command>

use clap::{Parser, Subcommand};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use docqa_rag::generation::{ConversationSession, ReplyKind, SessionSettings};
use docqa_rag::ingestion::{discover_documents, FileExtractor};
use docqa_rag::providers;
use docqa_rag::{RagConfig, RetrievalPipeline};

#[derive(Parser)]
#[command(name = "docqa-rag")]
#[command(about = "Ask questions about your documents", long_about = None)]
struct Cli {
    #[arg(short, long, global = true, help = "Path to a TOML configuration file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Ingest every supported document in a directory")]
    Ingest {
        #[arg(short, long, help = "Directory to ingest (defaults to storage.raw_dir)")]
        dir: Option<PathBuf>,
    },

    #[command(about = "Start an interactive chat session")]
    Chat,

    #[command(about = "Show the chunks retrieved for a question, without generation")]
    Query {
        #[arg(help = "The question to search for")]
        question: String,

        #[arg(short = 'k', long, default_value_t = 3, help = "Number of chunks to show")]
        top_k: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa_rag=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => {
            let mut config = RagConfig::from_file(path)?;
            config.apply_env();
            config.validate()?;
            config
        }
        None => RagConfig::load()?,
    };

    let embedder = providers::build_embedder(&config)?;
    let pipeline = Arc::new(RetrievalPipeline::open(&config, embedder, Arc::new(FileExtractor))?);
    let term = Term::stdout();

    match cli.command {
        Commands::Ingest { dir } => {
            let dir = dir.unwrap_or_else(|| config.storage.raw_dir.clone());
            let files = discover_documents(&dir)?;
            if files.is_empty() {
                term.write_line(&format!(
                    "{}",
                    style(format!("No supported documents in {}", dir.display())).yellow()
                ))?;
                return Ok(());
            }

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} {msg} [{elapsed}]")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner.set_message(format!("Ingesting {} documents...", files.len()));

            let report = pipeline.ingest(&files).await;
            spinner.finish_and_clear();
            let report = report?;

            for doc in &report.documents {
                term.write_line(&format!(
                    "{} {} ({} chunks)",
                    style("✓").green(),
                    doc.filename,
                    doc.total_chunks
                ))?;
            }
            for err in &report.errors {
                term.write_line(&format!(
                    "{} {}: {}",
                    style("✗").red(),
                    err.filename,
                    style(&err.error).dim()
                ))?;
            }
            term.write_line(&format!("{}", style(report.summary()).bold()))?;
            term.write_line(&format!(
                "Index now holds {} chunks ({})",
                pipeline.len(),
                pipeline.store_paths().index.display()
            ))?;
        }

        Commands::Chat => {
            let llm = providers::build_llm(&config)?;
            let mut session = ConversationSession::new(
                Uuid::new_v4(),
                Arc::clone(&pipeline),
                llm,
                SessionSettings::from_config(&config),
            );

            term.write_line(&format!(
                "{}",
                style(format!("{} assistant", config.session.assistant_name)).cyan().bold()
            ))?;
            term.write_line(&format!(
                "{}",
                style(format!("{} chunks indexed. Type 'exit' to quit.", pipeline.len())).dim()
            ))?;

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                term.write_str(&format!("{} ", style("You:").green().bold()))?;
                let Some(line) = lines.next_line().await? else {
                    break;
                };
                let message = line.trim();
                if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
                    break;
                }
                if message.is_empty() {
                    continue;
                }

                let reply = session.respond(message).await?;
                let label = match &reply.kind {
                    ReplyKind::Failed { .. } => style("Bot:").red().bold(),
                    _ => style("Bot:").blue().bold(),
                };
                term.write_line(&format!("{} {}", label, reply.text))?;
                if let ReplyKind::Grounded { sources } = &reply.kind {
                    term.write_line(&format!(
                        "{}",
                        style(format!("  sources: {}", sources.join(", "))).dim()
                    ))?;
                }
            }
        }

        Commands::Query { question, top_k } => {
            let results = pipeline.query(&question, top_k).await?;
            if results.is_empty() {
                term.write_line(&format!("{}", style("No results (index is empty)").yellow()))?;
            }
            for (rank, hit) in results.iter().enumerate() {
                term.write_line(&format!(
                    "{} {} [{}..{}] distance {:.4}",
                    style(format!("#{}", rank + 1)).cyan().bold(),
                    hit.metadata.source,
                    hit.metadata.start,
                    hit.metadata.end,
                    hit.distance
                ))?;
                term.write_line(&format!("{}\n", hit.metadata.text.trim()))?;
            }
        }
    }

    Ok(())
}
