use std::sync::Arc;
use ss_core::{cosine_similarity, Article, EmbeddingModel, Error, Result};
use tracing::debug;

pub const DEFAULT_THRESHOLD: f32 = 0.3;

/// Orders articles by semantic closeness to a free-text query.
#[derive(Debug, Clone)]
pub struct EmbeddingRanker {
    embedder: Arc<dyn EmbeddingModel>,
}

impl EmbeddingRanker {
    pub fn new(embedder: Arc<dyn EmbeddingModel>) -> Self {
        Self { embedder }
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingModel> {
        &self.embedder
    }

    /// Keep the articles scoring at least `threshold`, best first.
    ///
    /// Each kept article carries its score in `similarity`. Ties keep their
    /// input order. A blank query, or no articles, returns the input as is.
    pub async fn rank(&self, articles: Vec<Article>, query: &str, threshold: f32) -> Result<Vec<Article>> {
        let query = query.trim();
        if query.is_empty() || articles.is_empty() {
            return Ok(articles);
        }

        let query_embedding = self.embedder.embed(query).await?;
        let texts: Vec<String> = articles.iter().map(Article::embedding_text).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != articles.len() {
            return Err(Error::Inference(format!(
                "Embedded {} of {} articles",
                embeddings.len(),
                articles.len()
            )));
        }

        let total = articles.len();
        let mut ranked: Vec<Article> = articles
            .into_iter()
            .zip(embeddings)
            .filter_map(|(mut article, embedding)| {
                let score = cosine_similarity(&query_embedding, &embedding);
                (score >= threshold).then(|| {
                    article.similarity = Some(score);
                    article
                })
            })
            .collect();
        ranked.sort_by(|a, b| score_of(b).total_cmp(&score_of(a)));

        debug!("Ranked '{}': kept {} of {} articles", query, ranked.len(), total);
        Ok(ranked)
    }
}

pub(crate) fn score_of(article: &Article) -> f32 {
    article.similarity.unwrap_or(f32::NEG_INFINITY)
}
