use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use ss_core::{EmbeddingModel, Error, InferenceModel, Result};
use std::fmt;
use url::Url;
use crate::{endpoint, http_client};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.1";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// A model served by a local Ollama daemon. The same client serves
/// completions and embeddings; which one depends on the model name.
pub struct OllamaModel {
    client: Client,
    base_url: String,
    model_name: String,
}

impl OllamaModel {
    pub fn new(base_url: Option<String>, model_name: Option<String>) -> Result<Self> {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        // Fail early on typos rather than on the first request.
        Url::parse(&base_url)?;
        Ok(Self {
            client: http_client()?,
            base_url,
            model_name: model_name.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl fmt::Debug for OllamaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaModel")
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .finish()
    }
}

#[async_trait]
impl InferenceModel for OllamaModel {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model_name,
            prompt,
            system,
            stream: false,
        };
        let response = self
            .client
            .post(endpoint(&self.base_url, "api/generate"))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;
        Ok(response.response)
    }
}

#[async_trait]
impl EmbeddingModel for OllamaModel {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model_name,
            prompt: text,
        };
        let response = self
            .client
            .post(endpoint(&self.base_url, "api/embeddings"))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<EmbeddingResponse>()
            .await?;
        if response.embedding.is_empty() {
            return Err(Error::Inference(format!(
                "Ollama returned an empty embedding for model {}",
                self.model_name
            )));
        }
        Ok(response.embedding)
    }
}
