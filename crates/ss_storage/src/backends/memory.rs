use async_trait::async_trait;
use ss_core::{Chunk, Result, ScoredChunk, VectorStorage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use crate::{check_lengths, validate_collection};
use super::rank_chunks;

#[derive(Default)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<(Chunk, Vec<f32>)>>,
}

impl MemoryStore {
    pub fn store_chunks(&mut self, collection: &str, chunks: &[Chunk], embeddings: &[Vec<f32>]) {
        let entries = self.collections.entry(collection.to_string()).or_default();
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            if let Some((existing, stored)) = entries.iter_mut().find(|(c, _)| c.id == chunk.id) {
                *existing = chunk.clone();
                *stored = embedding.clone();
            } else {
                entries.push((chunk.clone(), embedding.clone()));
            }
        }
    }

    pub fn find_similar(&self, collection: &str, embedding: &[f32], limit: usize) -> Vec<ScoredChunk> {
        match self.collections.get(collection) {
            Some(entries) => rank_chunks(entries.iter().map(|(c, e)| (c, e)), embedding, limit),
            None => Vec::new(),
        }
    }

    pub fn drop_collection(&mut self, collection: &str) -> bool {
        self.collections.remove(collection).is_some()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, Vec::len)
    }

    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Process-local store; everything is lost on exit.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.store.read().await.len(collection)
    }

    pub async fn collection_names(&self) -> Vec<String> {
        self.store.read().await.collection_names()
    }
}

#[async_trait]
impl VectorStorage for MemoryStorage {
    async fn store_chunks(&self, collection: &str, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        validate_collection(collection)?;
        check_lengths(chunks.len(), embeddings.len())?;
        let mut store = self.store.write().await;
        store.store_chunks(collection, chunks, embeddings);
        debug!("Stored {} chunks in memory collection {}", chunks.len(), collection);
        Ok(())
    }

    async fn find_similar(&self, collection: &str, embedding: &[f32], limit: usize) -> Result<Vec<ScoredChunk>> {
        validate_collection(collection)?;
        let store = self.store.read().await;
        Ok(store.find_similar(collection, embedding, limit))
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        validate_collection(collection)?;
        let mut store = self.store.write().await;
        store.drop_collection(collection);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, text: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: text.to_string(),
            position: 0,
        }
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        let chunks = vec![chunk("a", "flooding in Marikina"), chunk("b", "PBA finals recap")];
        let embeddings = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        storage.store_chunks("articles", &chunks, &embeddings).await.unwrap();

        let similar = storage.find_similar("articles", &[0.9, 0.1, 0.0], 2).await.unwrap();
        assert_eq!(similar.len(), 2);
        assert_eq!(similar[0].chunk.id, "a");
        assert!(similar[0].score >= similar[1].score);

        let top = storage.find_similar("articles", &[0.0, 1.0, 0.0], 1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].chunk.id, "b");
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let storage = MemoryStorage::new();
        storage
            .store_chunks("article-one", &[chunk("a", "one")], &[vec![1.0, 0.0]])
            .await
            .unwrap();
        storage
            .store_chunks("article-two", &[chunk("b", "two")], &[vec![1.0, 0.0]])
            .await
            .unwrap();

        let hits = storage.find_similar("article-one", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.text, "one");

        storage.drop_collection("article-one").await.unwrap();
        assert_eq!(storage.len("article-one").await, 0);
        assert_eq!(storage.len("article-two").await, 1);
        assert!(storage.find_similar("article-one", &[1.0, 0.0], 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restoring_a_chunk_replaces_it() {
        let storage = MemoryStorage::new();
        storage.store_chunks("c", &[chunk("a", "old")], &[vec![1.0]]).await.unwrap();
        storage.store_chunks("c", &[chunk("a", "new")], &[vec![1.0]]).await.unwrap();
        assert_eq!(storage.len("c").await, 1);
        let hits = storage.find_similar("c", &[1.0], 1).await.unwrap();
        assert_eq!(hits[0].chunk.text, "new");
    }

    #[tokio::test]
    async fn test_mismatched_lengths_are_rejected() {
        let storage = MemoryStorage::new();
        let result = storage.store_chunks("c", &[chunk("a", "x")], &[]).await;
        assert!(result.is_err());
    }
}
