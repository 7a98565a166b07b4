use async_trait::async_trait;
use crate::types::{Chunk, ScoredChunk};
use crate::Result;

#[async_trait]
pub trait VectorStorage: Send + Sync {
    /// Store chunks with their embeddings in `collection`, creating it if needed
    async fn store_chunks(&self, collection: &str, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()>;

    /// Find the chunks closest to `embedding`, best first
    async fn find_similar(&self, collection: &str, embedding: &[f32], limit: usize) -> Result<Vec<ScoredChunk>>;

    /// Remove a collection and everything in it. Missing collections are not an error.
    async fn drop_collection(&self, collection: &str) -> Result<()>;

    fn name(&self) -> &str;
}
