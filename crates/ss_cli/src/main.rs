use clap::{Parser, Subcommand};
use ss_agent::{ArticleQa, ReactAgent, ToolRegistry};
use ss_core::{EmbeddingModel, InferenceModel, Result};
use ss_feeds::{init_logging, Aggregator, EmbeddingRanker, FeedFetcher, NewsArgs, PageFetcher, SourceCatalog};
use ss_inference::{EmbedderKind, EmbeddingConfig, LlmKind};
use ss_storage::{StorageConfig, StorageKind, DEFAULT_STORAGE_PATH};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Philippine news assistant", long_about = None)]
pub struct Cli {
    /// Vector store for article QA: memory, disk or qdrant
    #[arg(long, default_value = "memory", global = true)]
    storage: StorageKind,
    #[arg(long, default_value = DEFAULT_STORAGE_PATH, global = true)]
    storage_path: PathBuf,
    /// Qdrant URL
    #[arg(long, global = true)]
    backend_url: Option<String>,
    #[arg(long, default_value = "anthropic", global = true, help = "Language model: anthropic (default), ollama, openai, dummy")]
    llm: LlmKind,
    #[arg(long, global = true)]
    llm_model: Option<String>,
    #[arg(long, global = true)]
    llm_url: Option<String>,
    #[arg(long, default_value = "ollama", global = true, help = "Embedding model: ollama (default), openai, fastembed, dummy")]
    embedder: EmbedderKind,
    #[arg(long, global = true)]
    embedding_model: Option<String>,
    #[arg(long, global = true)]
    embedding_url: Option<String>,
    /// JSON file replacing the built-in outlet list
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    #[arg(long, default_value = ss_feeds::logging::DEFAULT_LOG_LEVEL, global = true)]
    log_level: String,
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_api_key: Option<String>,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the configured news outlets
    Sources,
    /// Browse headlines
    News(NewsArgs),
    /// Answer a question about one article
    Ask { url: String, question: String },
    /// Talk to the assistant; starts an interactive session without a message
    Chat { message: Option<String> },
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

impl Cli {
    fn llm_config(&self) -> ss_inference::Config {
        let api_key = match self.llm {
            LlmKind::Anthropic => self.anthropic_api_key.clone(),
            LlmKind::OpenAi => self.openai_api_key.clone(),
            LlmKind::Ollama | LlmKind::Dummy => None,
        };
        ss_inference::Config {
            kind: Some(self.llm),
            api_key,
            model_name: self.llm_model.clone(),
            base_url: self.llm_url.clone(),
        }
    }

    fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            kind: Some(self.embedder),
            api_key: match self.embedder {
                EmbedderKind::OpenAi => self.openai_api_key.clone(),
                _ => None,
            },
            model_name: self.embedding_model.clone(),
            base_url: self.embedding_url.clone(),
        }
    }

    fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            kind: self.storage,
            path: self.storage_path.clone(),
            url: self.backend_url.clone(),
        }
    }

    fn load_catalog(&self) -> Result<SourceCatalog> {
        match &self.catalog {
            Some(path) => {
                let catalog = SourceCatalog::from_file(path)?;
                info!("📚 Loaded {} sources from {}", catalog.len(), path.display());
                Ok(catalog)
            }
            None => Ok(SourceCatalog::default()),
        }
    }
}

struct Backends {
    aggregator: Arc<Aggregator>,
    embedder: Arc<dyn EmbeddingModel>,
}

async fn news_backends(cli: &Cli) -> Result<Backends> {
    let catalog = Arc::new(cli.load_catalog()?);
    let embedder = ss_inference::create_embedder(cli.embedding_config()).await?;
    let fetcher = Arc::new(FeedFetcher::new(catalog)?);
    let ranker = Arc::new(EmbeddingRanker::new(embedder.clone()));
    Ok(Backends {
        aggregator: Arc::new(Aggregator::new(fetcher, ranker)),
        embedder,
    })
}

async fn article_qa(cli: &Cli, backends: &Backends, model: Arc<dyn InferenceModel>) -> Result<Arc<ArticleQa>> {
    let storage = ss_storage::create_storage(&cli.storage_config()).await?;
    info!("💾 Vector store ready (using {})", storage.name());
    Ok(Arc::new(ArticleQa::new(
        PageFetcher::new()?,
        backends.embedder.clone(),
        model,
        storage,
    )))
}

async fn run_chat(agent: &ReactAgent, message: Option<String>) -> Result<()> {
    if let Some(message) = message {
        println!("{}", agent.chat(&message).await?.answer);
        return Ok(());
    }

    println!("🗞️  SariSariNews. Ask about the news; 'reset' clears the conversation, 'exit' quits.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "exit" | "quit" => break,
            "reset" => {
                agent.reset().await;
                println!("Conversation cleared");
            }
            message => match agent.chat(message).await {
                Ok(reply) => println!("{}", reply.answer),
                Err(e) => eprintln!("⚠️ {}", e),
            },
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Commands::Sources = cli.command {
        for source in cli.load_catalog()?.sources() {
            println!("{:<20} {}", source.name, source.url);
        }
        return Ok(());
    }

    let backends = news_backends(&cli).await?;
    if let Commands::News(args) = cli.command {
        return ss_feeds::handle_command(args, &backends.aggregator).await;
    }

    let model = ss_inference::create_model(cli.llm_config()).await?;
    let qa = article_qa(&cli, &backends, model.clone()).await?;

    match cli.command {
        Commands::Ask { url, question } => {
            println!("{}", qa.answer(&question, &url).await);
        }
        Commands::Chat { message } => {
            let tools = Arc::new(ToolRegistry::news_tools(backends.aggregator.clone(), qa));
            let catalog = backends.aggregator.fetcher().catalog();
            let agent = ReactAgent::new(model, tools, &catalog.names());
            run_chat(&agent, message).await?;
        }
        Commands::Serve { addr } => {
            let state = ss_web::AppState::new(backends.aggregator.clone(), qa, model);
            ss_web::serve(addr, state).await?;
        }
        Commands::Sources | Commands::News(_) => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["sarisari", "sources"]);
        assert_eq!(cli.storage, StorageKind::Memory);
        assert_eq!(cli.storage_path, PathBuf::from("db/articles"));
        assert_eq!(cli.llm, LlmKind::Anthropic);
        assert_eq!(cli.embedder, EmbedderKind::Ollama);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "sarisari", "news", "latest", "typhoon", "--limit", "3", "--llm", "dummy", "--embedder", "dummy", "--storage", "disk",
        ]);
        assert_eq!(cli.llm, LlmKind::Dummy);
        assert_eq!(cli.embedder, EmbedderKind::Dummy);
        assert_eq!(cli.storage_config().kind, StorageKind::Disk);
        assert!(matches!(cli.command, Commands::News(_)));
    }

    #[test]
    fn test_keys_follow_backend() {
        let cli = Cli::parse_from([
            "sarisari", "--llm", "openai", "--embedder", "openai", "--openai-api-key", "sk-test", "--anthropic-api-key", "ak-test",
            "chat", "hi",
        ]);
        assert_eq!(cli.llm_config().api_key.as_deref(), Some("sk-test"));
        assert_eq!(cli.embedding_config().api_key.as_deref(), Some("sk-test"));

        let cli = Cli::parse_from(["sarisari", "--anthropic-api-key", "ak-test", "ask", "https://x.ph", "why?"]);
        assert_eq!(cli.llm_config().api_key.as_deref(), Some("ak-test"));
        assert!(cli.embedding_config().api_key.is_none());
    }

    #[test]
    fn test_bad_backend_name_is_rejected() {
        assert!(Cli::try_parse_from(["sarisari", "--storage", "chroma", "sources"]).is_err());
    }
}
