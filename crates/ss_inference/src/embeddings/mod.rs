use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use ss_core::{EmbeddingModel, Error, Result};
use tracing::info;
use crate::models::{OllamaModel, OpenAiModel};

pub mod hashing;
#[cfg(feature = "fastembed")]
pub mod local;

pub use hashing::HashingEmbedder;
#[cfg(feature = "fastembed")]
pub use local::LocalEmbedder;

/// Sentence-transformers MiniLM, as published by Ollama.
const DEFAULT_OLLAMA_EMBEDDING_MODEL: &str = "all-minilm";
const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedderKind {
    Ollama,
    OpenAi,
    FastEmbed,
    Dummy,
}

impl FromStr for EmbedderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            "fastembed" | "local" => Ok(Self::FastEmbed),
            "dummy" | "hashing" => Ok(Self::Dummy),
            other => Err(Error::Config(format!(
                "Unknown embedder '{}'. Available: ollama, openai, fastembed, dummy",
                other
            ))),
        }
    }
}

impl fmt::Display for EmbedderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::FastEmbed => "fastembed",
            Self::Dummy => "dummy",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Default)]
pub struct EmbeddingConfig {
    pub kind: Option<EmbedderKind>,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub base_url: Option<String>,
}

impl fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("kind", &self.kind)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .finish()
    }
}

pub async fn create_embedder(config: EmbeddingConfig) -> Result<Arc<dyn EmbeddingModel>> {
    let kind = config.kind.unwrap_or(EmbedderKind::Ollama);
    let embedder: Arc<dyn EmbeddingModel> = match kind {
        EmbedderKind::Ollama => Arc::new(OllamaModel::new(
            config.base_url,
            Some(config.model_name.unwrap_or_else(|| DEFAULT_OLLAMA_EMBEDDING_MODEL.to_string())),
        )?),
        EmbedderKind::OpenAi => Arc::new(OpenAiModel::new(crate::Config {
            kind: None,
            api_key: config.api_key,
            model_name: Some(config.model_name.unwrap_or_else(|| DEFAULT_OPENAI_EMBEDDING_MODEL.to_string())),
            base_url: config.base_url,
        })?),
        #[cfg(feature = "fastembed")]
        EmbedderKind::FastEmbed => Arc::new(LocalEmbedder::new()?),
        #[cfg(not(feature = "fastembed"))]
        EmbedderKind::FastEmbed => {
            return Err(Error::Config(
                "Local embeddings are not compiled in; rebuild with the 'fastembed' feature".to_string(),
            ))
        }
        EmbedderKind::Dummy => Arc::new(HashingEmbedder::default()),
    };
    info!("Embedding model ready: {} ({})", embedder.name(), kind);
    Ok(embedder)
}
