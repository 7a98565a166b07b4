use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use ss_core::{Error, InferenceModel, Result};
use tracing::info;

pub mod anthropic;
pub mod dummy;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicModel;
pub use dummy::DummyModel;
pub use ollama::OllamaModel;
pub use openai::OpenAiModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmKind {
    Anthropic,
    Ollama,
    OpenAi,
    Dummy,
}

impl FromStr for LlmKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            "openai" | "deepseek" => Ok(Self::OpenAi),
            "dummy" => Ok(Self::Dummy),
            other => Err(Error::Config(format!(
                "Unknown language model '{}'. Available: anthropic, ollama, openai, dummy",
                other
            ))),
        }
    }
}

impl fmt::Display for LlmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::Dummy => "dummy",
        };
        f.write_str(name)
    }
}

/// Language model selection. Unset fields fall back to each backend's defaults.
#[derive(Clone, Default)]
pub struct Config {
    pub kind: Option<LlmKind>,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub base_url: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("kind", &self.kind)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .finish()
    }
}

pub async fn create_model(config: Config) -> Result<Arc<dyn InferenceModel>> {
    let kind = config.kind.unwrap_or(LlmKind::Anthropic);
    let model: Arc<dyn InferenceModel> = match kind {
        LlmKind::Anthropic => Arc::new(AnthropicModel::new(config)?),
        LlmKind::Ollama => Arc::new(OllamaModel::new(config.base_url, config.model_name)?),
        LlmKind::OpenAi => Arc::new(OpenAiModel::new(config)?),
        LlmKind::Dummy => Arc::new(DummyModel::new()),
    };
    info!("Language model ready: {} ({})", model.name(), kind);
    Ok(model)
}
