use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use portfolio_chat::api::serve_api;
use portfolio_chat::config::AppConfig;
use portfolio_chat::embeddings::EmbeddingClient;
use portfolio_chat::ingest::ingest_knowledge_base;
use portfolio_chat::llm::LlmService;
use portfolio_chat::logging;
use portfolio_chat::rag::RagService;
use portfolio_chat::vector::ensure_dimension;
use portfolio_chat::vector::PineconeIndex;
use portfolio_chat::Result;
use tracing::info;

#[derive(Parser)]
#[command(name = "portfolio-chat")]
#[command(about = "Retrieval-augmented chat backend for a portfolio knowledge base")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./config.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP chat API
    Serve {
        /// Host to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Ask a single question and print the answer
    Ask {
        /// The question to ask
        question: String,
        /// Also print the retrieved passages
        #[arg(long)]
        sources: bool,
    },
    /// Embed the knowledge-base file and upsert it into the vector index
    Ingest {
        /// Knowledge-base file (overrides ingest.knowledge_base_path)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// List the generative models available to the configured API key
    Models,
    /// Show current configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let _guard = init_logging(&config, cli.verbose)?;
            config.validate()?;
            serve(&config).await?;
        }
        Commands::Ask { question, sources } => {
            init_console_logging(cli.verbose)?;
            config.validate()?;
            ask(&config, &question, sources).await?;
        }
        Commands::Ingest { file } => {
            let _guard = init_logging(&config, cli.verbose)?;
            config.validate()?;
            let path = file.unwrap_or_else(|| PathBuf::from(&config.ingest.knowledge_base_path));
            ingest(&config, path).await?;
        }
        Commands::Models => {
            init_console_logging(cli.verbose)?;
            config.validate_llm_access()?;
            list_models(&config).await?;
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config.redacted())?);
        }
    }

    Ok(())
}

fn init_logging(
    config: &AppConfig,
    verbose: bool,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    if verbose {
        logging::init_logging_with_level(&config.logging, "debug")
    } else {
        logging::init_logging(&config.logging)
    }
}

fn init_console_logging(verbose: bool) -> Result<()> {
    logging::init_simple_logging(if verbose { "debug" } else { "info" })
}

async fn serve(config: &AppConfig) -> Result<()> {
    let rag_service = Arc::new(RagService::from_config(config).await?);
    info!(
        "RAG pipeline ready (embedding model: {}, llm: {}, top_k: {})",
        config.embedding_model(),
        config.llm_model(),
        config.top_k()
    );
    serve_api(config, rag_service).await
}

async fn ask(config: &AppConfig, question: &str, show_sources: bool) -> Result<()> {
    let rag_service = RagService::from_config(config).await?;
    let response = rag_service.query(question).await?;

    if show_sources {
        println!("{}", response.format(&config.rag.fallbacks));
    } else {
        println!("{}", rag_service.render(&response.outcome));
    }

    Ok(())
}

async fn ingest(config: &AppConfig, path: PathBuf) -> Result<()> {
    println!("{}", "=".repeat(50));
    println!("Portfolio Knowledge Base Ingestion");
    println!("{}", "=".repeat(50));

    let embedder = EmbeddingClient::from_config(config)?;
    let store = PineconeIndex::from_config(config).await?;
    ensure_dimension(&store, config.embedding_dimension()).await?;

    let stats =
        ingest_knowledge_base(&path, &embedder, &store, config.ingest.batch_size).await?;

    println!("\n{}", "=".repeat(50));
    println!("SUCCESS: Knowledge base ingested!");
    println!("Chunks: {}", stats.chunks);
    println!("Batches: {}", stats.batches);
    println!("Total vectors: {}", stats.upserted);
    println!("{}", "=".repeat(50));

    Ok(())
}

async fn list_models(config: &AppConfig) -> Result<()> {
    println!("Fetching available models...");
    let llm = LlmService::from_config(config)?;

    for model in llm.list_models().await? {
        println!("found: {}", model.name);
    }

    Ok(())
}
