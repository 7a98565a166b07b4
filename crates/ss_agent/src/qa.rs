use std::sync::Arc;
use ss_core::{Chunk, EmbeddingModel, Error, InferenceModel, Result, ScoredChunk, VectorStorage};
use ss_feeds::PageFetcher;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const ARTICLE_FETCH_FAILED: &str = "Failed to fetch the article content. Please check the URL and try again.";
pub const QA_FAILED: &str = "Failed to answer the question from the article. Please try again later.";

pub const DEFAULT_CHUNK_WORDS: usize = 256;
pub const DEFAULT_CHUNK_OVERLAP: usize = 20;
pub const DEFAULT_TOP_K: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QaConfig {
    pub chunk_words: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            chunk_words: DEFAULT_CHUNK_WORDS,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QaAnswer {
    pub answer: String,
    /// Chunks handed to the model, best match first.
    pub context: Vec<ScoredChunk>,
}

/// Retrieval-augmented answers grounded in a single web article.
///
/// Every question gets its own throwaway collection, so concurrent calls on
/// a shared store never read each other's chunks.
pub struct ArticleQa {
    pages: PageFetcher,
    embedder: Arc<dyn EmbeddingModel>,
    model: Arc<dyn InferenceModel>,
    storage: Arc<dyn VectorStorage>,
    config: QaConfig,
}

impl ArticleQa {
    pub fn new(
        pages: PageFetcher,
        embedder: Arc<dyn EmbeddingModel>,
        model: Arc<dyn InferenceModel>,
        storage: Arc<dyn VectorStorage>,
    ) -> Self {
        Self {
            pages,
            embedder,
            model,
            storage,
            config: QaConfig::default(),
        }
    }

    pub fn with_config(mut self, config: QaConfig) -> Self {
        self.config = config;
        self
    }

    /// Answer `question` from the article at `url`.
    ///
    /// Never fails: a page that cannot be fetched or holds no paragraphs
    /// yields [`ARTICLE_FETCH_FAILED`], any later failure [`QA_FAILED`].
    pub async fn answer(&self, question: &str, url: &str) -> String {
        let text = match self.pages.fetch_text(url).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Could not fetch article {}: {}", url, e);
                return ARTICLE_FETCH_FAILED.to_string();
            }
        };
        match self.answer_text(question, &text).await {
            Ok(answer) => answer.answer,
            Err(e) => {
                error!("Question answering failed for {}: {}", url, e);
                QA_FAILED.to_string()
            }
        }
    }

    pub async fn try_answer(&self, question: &str, url: &str) -> Result<QaAnswer> {
        let text = self.pages.fetch_text(url).await?;
        self.answer_text(question, &text).await
    }

    /// Index `text` in a fresh collection, answer, then drop the collection.
    pub async fn answer_text(&self, question: &str, text: &str) -> Result<QaAnswer> {
        let collection = format!("article-{}", Uuid::new_v4());
        let result = self.answer_in(&collection, question, text).await;
        if let Err(e) = self.storage.drop_collection(&collection).await {
            warn!("Could not drop collection {}: {}", collection, e);
        }
        result
    }

    async fn answer_in(&self, collection: &str, question: &str, text: &str) -> Result<QaAnswer> {
        let pieces = chunk_words(text, self.config.chunk_words, self.config.chunk_overlap);
        if pieces.is_empty() {
            return Err(Error::Extraction("Article has no text".to_string()));
        }
        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(position, text)| Chunk {
                id: format!("chunk-{}", position),
                text,
                position,
            })
            .collect();

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        self.storage.store_chunks(collection, &chunks, &embeddings).await?;
        debug!("Indexed {} chunks in {}", chunks.len(), collection);

        let query = self.embedder.embed(question).await?;
        let context = self
            .storage
            .find_similar(collection, &query, self.config.top_k)
            .await?;

        let context_text = context
            .iter()
            .map(|c| c.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let answer = self
            .model
            .complete(None, &context_prompt(&context_text, question))
            .await?;
        info!("Answered from {} of {} chunks", context.len(), chunks.len());

        Ok(QaAnswer {
            answer: answer.trim().to_string(),
            context,
        })
    }
}

/// Split on whitespace into windows of `size` words, each starting
/// `size - overlap` words after the previous one.
pub fn chunk_words(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    let size = size.max(1);
    let step = size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }
    chunks
}

pub fn context_prompt(context: &str, question: &str) -> String {
    format!(
        "Context information is below.\n\
         ---------------------\n\
         {}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {}\n\
         Answer: ",
        context, question
    )
}
