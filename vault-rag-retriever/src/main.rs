use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::{JoinError, JoinHandle};
use tracing_subscriber::EnvFilter;
use vault_rag_embed::{OllamaChatProvider, OllamaEmbedProvider};
use vault_rag_retriever::{
    config::RagConfig,
    retrieval::{
        pipeline::{Answer, IngestReport, RagPipeline},
        ranker::SearchConfig,
    },
    status::{ServiceStatus, VaultSummary},
    storage::VaultStore,
};

const PROMPT: &str = "Ask a question about your document (or type 'quit' to exit): ";

/// Ask questions about a document, grounded in its most relevant passages.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Vault file holding the chunked document
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    /// Base URL of the model service
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Maximum chunk length in characters
    #[arg(long, global = true)]
    chunk_size: Option<usize>,

    /// Number of chunks used as context
    #[arg(long, global = true)]
    top_k: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chunk a text document into the vault and embed it
    Ingest {
        /// Plain-text document
        document: PathBuf,
    },
    /// List the chunks stored in the vault
    Chunks {
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Rank vault chunks against a query
    Search {
        query: String,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Answer questions about a document
    Ask {
        /// Document to ingest first; the existing vault is used when omitted
        document: Option<PathBuf>,
        /// Answer a single question instead of starting an interactive session
        #[arg(short, long)]
        question: Option<String>,
    },
    /// Show model service, vault and configuration status
    Status {
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[derive(Serialize)]
struct ChunkOutput<'a> {
    ordinal: usize,
    text: &'a str,
    chars: usize,
}

#[derive(Serialize)]
struct StatusOutput {
    service: ServiceStatus,
    vault: Option<VaultSummary>,
    search: SearchConfig,
    max_chunk_chars: usize,
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    match args.command {
        Commands::Ingest { document } => {
            let pipeline = build_pipeline(config)?;
            let report = pipeline
                .ingest_file(&document)
                .await
                .with_context(|| format!("Failed to ingest {}", document.display()))?;

            print_report(&report);
            if let Some(vault) = pipeline.vault() {
                println!("Vault: {}", vault.path().display());
            }
            Ok(())
        }
        Commands::Chunks { format } => {
            let store = vault_store(&config)?;
            let chunks = store.read_chunks()?;

            match format {
                OutputFormat::Json => {
                    let output: Vec<ChunkOutput> = chunks
                        .iter()
                        .enumerate()
                        .map(|(ordinal, text)| ChunkOutput {
                            ordinal,
                            text,
                            chars: text.chars().count(),
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Summary => {
                    println!(
                        "Found {} chunks in {}:",
                        chunks.len(),
                        store.path().display()
                    );
                    for (ordinal, text) in chunks.iter().enumerate() {
                        println!(
                            "  [{ordinal}] ({} chars) {}",
                            text.chars().count(),
                            preview(text, 80)
                        );
                    }
                }
            }
            Ok(())
        }
        Commands::Search { query, format } => {
            let pipeline = build_pipeline(config)?;
            pipeline
                .load_vault()
                .await
                .context("Failed to load the vault")?;
            let results = pipeline.retrieve(&query).await?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&results)?);
                }
                OutputFormat::Summary => {
                    println!("Found {} relevant chunks:", results.len());
                    for result in results {
                        println!(
                            "  Score: {:.3} | Chunk: {} | {}",
                            result.score,
                            result.ordinal,
                            preview(&result.text, 80)
                        );
                    }
                }
            }
            Ok(())
        }
        Commands::Ask { document, question } => {
            let pipeline = Arc::new(build_pipeline(config)?);
            let report = match document {
                Some(document) => pipeline
                    .ingest_file(&document)
                    .await
                    .with_context(|| format!("Failed to ingest {}", document.display()))?,
                None => pipeline
                    .load_vault()
                    .await
                    .context("Failed to load the vault")?,
            };
            print_report(&report);

            match question {
                Some(question) => {
                    let answer = pipeline.answer_with_context(&question).await;
                    print_answer(&answer);
                }
                None => interactive(pipeline).await?,
            }
            Ok(())
        }
        Commands::Status { format } => {
            let service = ServiceStatus::probe(&config.service_config()).await;
            let vault = config
                .vault_path()
                .map(|path| VaultSummary::inspect(&VaultStore::new(path)));
            let output = StatusOutput {
                service,
                vault,
                search: config.search,
                max_chunk_chars: config.chunking.max_chunk_chars,
            };

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Summary => print_status(&output),
            }
            Ok(())
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<RagConfig> {
    let mut config = RagConfig::load_or_default(args.config.as_deref())?;

    if let Some(vault) = &args.vault {
        config.storage.vault_path = Some(vault.clone());
    }
    if let Some(base_url) = &args.base_url {
        config.service.base_url = base_url.clone();
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunking.max_chunk_chars = chunk_size;
    }
    if let Some(top_k) = args.top_k {
        config.search.top_k = top_k;
    }

    config.validate()?;
    Ok(config)
}

fn build_pipeline(config: RagConfig) -> anyhow::Result<RagPipeline> {
    let service = config.service_config();
    let embedder = Arc::new(OllamaEmbedProvider::new(service.clone())?);
    let chat = Arc::new(OllamaChatProvider::new(service)?);
    Ok(RagPipeline::new(config, embedder, chat)?)
}

fn vault_store(config: &RagConfig) -> anyhow::Result<VaultStore> {
    config
        .vault_path()
        .map(VaultStore::new)
        .context("No vault path configured")
}

/// Read questions from stdin until `quit` or end of input.
///
/// Each answer is produced on its own task while stdin keeps being read, so
/// the session stays responsive. Only one question is answered at a time;
/// input arriving meanwhile is turned away. On `quit` or end of input a
/// pending answer is still awaited and printed.
async fn interactive(pipeline: Arc<RagPipeline>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut pending: Option<JoinHandle<Answer>> = None;

    prompt(&mut stdout).await?;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let query = line.trim().to_string();
                if query.eq_ignore_ascii_case("quit") {
                    break;
                }
                if pending.is_some() {
                    if !query.is_empty() {
                        let notice = "Still answering the previous question, please wait.";
                        println!("{}", style(notice).yellow());
                    }
                    continue;
                }
                if query.is_empty() {
                    prompt(&mut stdout).await?;
                    continue;
                }

                let task_pipeline = Arc::clone(&pipeline);
                pending = Some(tokio::spawn(async move {
                    task_pipeline.answer_with_context(&query).await
                }));
                println!("{}", style("Thinking...").dim());
            }
            finished = wait_for(&mut pending), if pending.is_some() => {
                pending = None;
                show_outcome(finished);
                prompt(&mut stdout).await?;
            }
        }
    }

    if let Some(task) = pending.take() {
        show_outcome(task.await);
    }
    println!("Goodbye!");
    Ok(())
}

async fn prompt(stdout: &mut tokio::io::Stdout) -> std::io::Result<()> {
    stdout.write_all(PROMPT.as_bytes()).await?;
    stdout.flush().await
}

/// Resolves once the pending answer task finishes; never resolves without one.
async fn wait_for(task: &mut Option<JoinHandle<Answer>>) -> Result<Answer, JoinError> {
    match task {
        Some(task) => task.await,
        None => std::future::pending().await,
    }
}

/// A failed answer task ends that question, not the session.
fn show_outcome(outcome: Result<Answer, JoinError>) {
    match outcome {
        Ok(answer) => print_answer(&answer),
        Err(e) => eprintln!("Error: answer task failed: {e}"),
    }
}

fn print_report(report: &IngestReport) {
    println!(
        "Embedded {} chunks (dimension {}) in {:.2?}",
        report.chunks, report.dimension, report.elapsed
    );
}

fn print_answer(answer: &Answer) {
    if let Some(context) = &answer.context {
        println!("\nRelevant context:\n{}", style(context).cyan());
    }
    println!("\n{}\n", style(&answer.reply).green());
}

fn print_status(output: &StatusOutput) {
    let service = &output.service;
    println!("Vault RAG Status");
    println!("================");

    println!("\nModel service: {}", service.base_url);
    if service.reachable {
        println!("  Reachable: {}", style("Yes").green());
        println!(
            "  Embedding model: {} ({})",
            service.embedding_model,
            installed(service.embedding_model_installed)
        );
        println!(
            "  Chat model: {} ({})",
            service.chat_model,
            installed(service.chat_model_installed)
        );
        println!("  Installed models: {}", service.models.join(", "));
    } else {
        println!("  Reachable: {}", style("No").red());
        if let Some(error) = &service.error {
            println!("  Error: {error}");
        }
    }

    println!("\nVault:");
    match &output.vault {
        Some(vault) => {
            println!("  Path: {}", vault.path);
            match vault.chunks {
                Some(chunks) => println!("  Chunks: {chunks}"),
                None if vault.exists => println!("  Chunks: unreadable"),
                None => println!("  Chunks: none (not ingested yet)"),
            }
        }
        None => println!("  Not configured"),
    }

    println!("\nConfiguration:");
    println!("  Max chunk chars: {}", output.max_chunk_chars);
    println!("  Top K: {}", output.search.top_k);
    println!(
        "  Similarity threshold: {} ({})",
        output.search.similarity_threshold,
        if output.search.enforce_threshold {
            "enforced"
        } else {
            "advisory"
        }
    );
}

fn installed(present: bool) -> &'static str {
    if present { "installed" } else { "missing" }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}
