pub mod models;
pub mod error;
pub mod storage;
pub mod types;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use error::{Error, Result};
pub use models::{EmbeddingModel, InferenceModel};
pub use storage::VectorStorage;
pub use types::{Article, Chunk, ScoredChunk};

/// Cosine similarity of two vectors, in [-1, 1].
///
/// Returns 0.0 when the lengths differ or either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Drop later articles sharing a title+link key, keeping first-seen order.
pub fn dedup_articles(articles: Vec<Article>) -> Vec<Article> {
    let mut seen = std::collections::HashSet::new();
    articles
        .into_iter()
        .filter(|article| seen.insert((article.title.clone(), article.link.clone())))
        .collect()
}
