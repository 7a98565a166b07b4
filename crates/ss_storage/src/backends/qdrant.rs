use async_trait::async_trait;
use qdrant_client::{
    Payload, Qdrant,
    qdrant::{
        vectors_config::Config, CreateCollection, Distance, PointStruct, SearchPoints,
        UpsertPoints, VectorParams, VectorsConfig,
    },
};
use serde_json::json;
use ss_core::{Chunk, Error, Result, ScoredChunk, VectorStorage};
use std::env;
use tracing::info;
use uuid::Uuid;
use crate::{check_lengths, validate_collection};

fn storage_error(e: impl std::fmt::Display) -> Error {
    Error::Storage(format!("Qdrant: {}", e))
}

pub struct QdrantStorage {
    client: Qdrant,
    url: String,
}

impl QdrantStorage {
    /// Connect to `url`, or to `http://$QDRANT_HOST:6334` when none is given.
    pub async fn connect(url: Option<&str>) -> Result<Self> {
        let url = match url {
            Some(url) => url.to_string(),
            None => {
                let host = env::var("QDRANT_HOST").unwrap_or_else(|_| "localhost".to_string());
                format!("http://{}:6334", host)
            }
        };
        let client = Qdrant::from_url(&url).build().map_err(storage_error)?;
        info!("Connected to Qdrant at {}", url);
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn ensure_collection(&self, collection: &str, vector_size: u64) -> Result<()> {
        if self.client.collection_exists(collection).await.map_err(storage_error)? {
            return Ok(());
        }
        self.client
            .create_collection(CreateCollection {
                collection_name: collection.to_string(),
                vectors_config: Some(VectorsConfig {
                    config: Some(Config::Params(VectorParams {
                        size: vector_size,
                        distance: Distance::Cosine.into(),
                        ..Default::default()
                    })),
                }),
                ..Default::default()
            })
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}

#[async_trait]
impl VectorStorage for QdrantStorage {
    async fn store_chunks(&self, collection: &str, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        validate_collection(collection)?;
        check_lengths(chunks.len(), embeddings.len())?;
        let Some(first) = embeddings.first() else {
            return Ok(());
        };
        self.ensure_collection(collection, first.len() as u64).await?;

        let mut points = Vec::with_capacity(chunks.len());
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            let payload: Payload = json!({
                "chunk_id": chunk.id,
                "text": chunk.text,
                "position": chunk.position,
            })
            .try_into()
            .map_err(storage_error)?;
            points.push(PointStruct::new(Uuid::new_v4().to_string(), embedding.clone(), payload));
        }

        self.client
            .upsert_points(UpsertPoints {
                collection_name: collection.to_string(),
                points,
                wait: Some(true),
                ..Default::default()
            })
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn find_similar(&self, collection: &str, embedding: &[f32], limit: usize) -> Result<Vec<ScoredChunk>> {
        validate_collection(collection)?;
        if !self.client.collection_exists(collection).await.map_err(storage_error)? {
            return Ok(Vec::new());
        }
        let results = self
            .client
            .search_points(SearchPoints {
                collection_name: collection.to_string(),
                vector: embedding.to_vec(),
                limit: limit as u64,
                with_payload: Some(true.into()),
                ..Default::default()
            })
            .await
            .map_err(storage_error)?;

        let mut scored = Vec::new();
        for point in results.result {
            let text = point.payload.get("text").and_then(|v| v.as_str()).cloned();
            let id = point.payload.get("chunk_id").and_then(|v| v.as_str()).cloned();
            let position = point
                .payload
                .get("position")
                .and_then(|v| v.as_integer())
                .unwrap_or_default();
            if let (Some(text), Some(id)) = (text, id) {
                scored.push(ScoredChunk {
                    chunk: Chunk {
                        id,
                        text,
                        position: position.max(0) as usize,
                    },
                    score: point.score,
                });
            }
        }
        Ok(scored)
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        validate_collection(collection)?;
        if self.client.collection_exists(collection).await.map_err(storage_error)? {
            self.client.delete_collection(collection).await.map_err(storage_error)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}
