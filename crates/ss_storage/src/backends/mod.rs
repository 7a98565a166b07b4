pub mod memory;
pub mod disk;

#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use memory::MemoryStorage;
pub use disk::DiskStorage;

#[cfg(feature = "qdrant")]
pub use qdrant::QdrantStorage;

use ss_core::{cosine_similarity, Chunk, ScoredChunk};

/// Brute-force nearest neighbours over stored (chunk, embedding) pairs.
pub(crate) fn rank_chunks<'a, I>(entries: I, embedding: &[f32], limit: usize) -> Vec<ScoredChunk>
where
    I: IntoIterator<Item = (&'a Chunk, &'a Vec<f32>)>,
{
    let mut scored: Vec<ScoredChunk> = entries
        .into_iter()
        .map(|(chunk, stored)| ScoredChunk {
            chunk: chunk.clone(),
            score: cosine_similarity(embedding, stored),
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);
    scored
}
