use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use shredder_core::Config;
use shredder_index::retriever::RetrievedChunk;
use shredder_index::{CodeIndexer, IndexReport, ProjectIndex, Retriever};
use shredder_llm::ollama::OllamaProvider;

/// Semantic index and question answering over a source tree.
#[derive(Parser)]
#[command(name = "shredder", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    ///
    /// Falls back to `SHREDDER_CONFIG`, then `config/default.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk, embed and index a directory, then print the run report.
    Index {
        /// Directory to index (overrides `application.codebase_path`).
        #[arg(long)]
        root: Option<PathBuf>,

        /// Write every chunk record to stdout as a JSON line.
        #[arg(long)]
        json: bool,
    },

    /// Index a directory and answer each question against it.
    Ask {
        /// Directory to index (overrides `application.codebase_path`).
        #[arg(long)]
        root: Option<PathBuf>,

        /// Chunks retrieved per question (overrides `retrieval.top_k`).
        #[arg(long)]
        top_k: Option<usize>,

        /// Print the retrieved chunks before each answer.
        #[arg(long)]
        show_sources: bool,

        #[arg(required = true, num_args = 1..)]
        questions: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    init_subscriber(&config_path);

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    tokio::select! {
        result = run(cli.command, &config) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted");
            Ok(ExitCode::from(130))
        }
    }
}

async fn run(command: Command, config: &Config) -> anyhow::Result<ExitCode> {
    match command {
        Command::Index { root, json } => {
            let root = root.unwrap_or_else(|| config.codebase_root());
            let project = build_index(config, &root).await?;
            if json {
                write_json_lines(&project)?;
                eprintln!("{}", project.report);
            } else {
                print_report(&project.report);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Ask {
            root,
            top_k,
            show_sources,
            questions,
        } => {
            if top_k == Some(0) {
                anyhow::bail!("--top-k must be at least 1");
            }
            let root = root.unwrap_or_else(|| config.codebase_root());
            let project = build_index(config, &root).await?;
            print_report(&project.report);

            let mut retrieval = config.retrieval_config();
            if let Some(k) = top_k {
                retrieval.top_k = k;
            }
            let provider = Arc::new(OllamaProvider::new(config.ollama_config()));
            let retriever = Retriever::new(provider, Arc::clone(&project.index), retrieval);
            tracing::info!(
                questions = questions.len(),
                top_k = retriever.config().top_k,
                "answering"
            );

            let mut failed = 0usize;
            for question in &questions {
                println!("\n>>> {question}");
                match retriever.answer(question).await {
                    Ok(answer) => {
                        if show_sources {
                            print_sources(&answer.sources);
                        }
                        println!("{}", answer.text);
                    }
                    Err(e) => {
                        tracing::error!(question = %question, error = %e, "query failed");
                        eprintln!("error: {e}");
                        failed += 1;
                    }
                }
            }

            Ok(if failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn build_index(config: &Config, root: &Path) -> anyhow::Result<ProjectIndex> {
    let provider = OllamaProvider::new(config.ollama_config());
    if let Err(e) = provider.health_check().await {
        tracing::warn!(
            base_url = provider.base_url(),
            error = %e,
            "embedding service unreachable, chunks will not be embedded"
        );
    }

    let indexer = CodeIndexer::new(Arc::new(provider), config.indexer_config());
    indexer
        .index_project(root)
        .await
        .with_context(|| format!("failed to index {}", root.display()))
}

fn write_json_lines(project: &ProjectIndex) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    for chunk in &project.chunks {
        serde_json::to_writer(&mut out, chunk).context("failed to serialize chunk")?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn print_report(report: &IndexReport) {
    print!("{}", render_report(report));
}

fn render_report(report: &IndexReport) -> String {
    let mut out = format!(
        "Visited {} files ({} failed, {} skipped by extension).\n\
         Successfully embedded {} out of {} chunks ({:.1}% coverage).\n",
        report.files_visited,
        report.files_failed,
        report.files_skipped,
        report.chunks_embedded,
        report.chunks_created,
        report.embedding_coverage() * 100.0
    );
    for error in &report.errors {
        out.push_str(&format!("  skipped: {error}\n"));
    }
    out
}

fn print_sources(sources: &[RetrievedChunk]) {
    for (rank, source) in sources.iter().enumerate() {
        println!(
            "  [{}] {} (distance {:.4})",
            rank + 1,
            source.chunk.display_header(),
            source.distance
        );
    }
    println!();
}

fn resolve_config_path(cli_path: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("SHREDDER_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn init_subscriber(config_path: &Path) {
    let level = Config::load(config_path)
        .map(|c| c.logging.level)
        .unwrap_or_else(|_| "info".into());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
