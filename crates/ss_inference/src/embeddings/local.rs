use async_trait::async_trait;
use fastembed::{EmbeddingModel as FastEmbedModel, InitOptions, TextEmbedding};
use ss_core::{EmbeddingModel, Error, Result};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::info;

/// all-MiniLM-L6-v2 running in-process through ONNX Runtime.
pub struct LocalEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
}

impl LocalEmbedder {
    pub fn new() -> Result<Self> {
        info!("Loading all-MiniLM-L6-v2 (first run downloads the model)");
        let model = TextEmbedding::try_new(InitOptions::new(FastEmbedModel::AllMiniLML6V2))
            .map_err(|e| Error::Inference(format!("Failed to load embedding model: {}", e)))?;
        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

impl fmt::Debug for LocalEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEmbedder")
            .field("model", &"all-MiniLM-L6-v2")
            .finish()
    }
}

#[async_trait]
impl EmbeddingModel for LocalEmbedder {
    fn name(&self) -> &str {
        "FastEmbed"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| Error::Inference("Embedding model returned nothing".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = self.model.clone();
        let texts = texts.to_vec();
        // Inference is CPU bound; keep it off the async workers.
        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| Error::Inference("Embedding model lock poisoned".to_string()))?;
            model
                .embed(texts, None)
                .map_err(|e| Error::Inference(format!("Failed to generate embedding: {}", e)))
        })
        .await
        .map_err(|e| Error::Inference(format!("Embedding task failed: {}", e)))?
    }
}
