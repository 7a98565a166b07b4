use std::sync::Arc;
use futures::future::join_all;
use ss_core::{dedup_articles, Article, Result};
use tracing::info;
use crate::fetcher::FeedFetcher;
use crate::logging::Logger;
use crate::ranker::EmbeddingRanker;

pub const DEFAULT_THRESHOLD: f32 = 0.25;

/// Fans a request out to every catalog source and merges the answers.
#[derive(Debug, Clone)]
pub struct Aggregator {
    fetcher: Arc<FeedFetcher>,
    ranker: Arc<EmbeddingRanker>,
}

impl Aggregator {
    pub fn new(fetcher: Arc<FeedFetcher>, ranker: Arc<EmbeddingRanker>) -> Self {
        Self { fetcher, ranker }
    }

    pub fn fetcher(&self) -> &Arc<FeedFetcher> {
        &self.fetcher
    }

    pub fn ranker(&self) -> &Arc<EmbeddingRanker> {
        &self.ranker
    }

    pub async fn collect(&self, query: Option<&str>, threshold: f32) -> Vec<Article> {
        self.collect_limited(query, threshold, None).await
    }

    /// Latest news across all sources, optionally ranked against `query`.
    ///
    /// Sources are fetched concurrently but merged in catalog order, then
    /// deduplicated keeping the first copy of each title+link. A failing
    /// source contributes nothing. With a query each source's block is ranked
    /// on its own; the blocks keep catalog order. `limit` truncates the final list.
    pub async fn collect_limited(&self, query: Option<&str>, threshold: f32, limit: Option<usize>) -> Vec<Article> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let names = self.fetcher.catalog().names();

        let per_source = join_all(
            names
                .iter()
                .map(|name| self.collect_source(name, query, threshold)),
        )
        .await;

        let logger = Logger::new().with_prefix("[aggregator]".to_string());
        let mut merged = Vec::new();
        for (name, result) in names.iter().zip(per_source) {
            let source_logger = logger.clone().with_prefix(format!("[{}]", name));
            match result {
                Ok(articles) => {
                    source_logger.debug(&format!("{} articles", articles.len()));
                    merged.extend(articles);
                }
                Err(e) => source_logger.warn(&format!("skipped: {}", e)),
            }
        }

        let mut articles = dedup_articles(merged);
        if let Some(limit) = limit {
            articles.truncate(limit);
        }

        info!("Aggregated {} articles from {} sources", articles.len(), names.len());
        articles
    }

    async fn collect_source(&self, source: &str, query: Option<&str>, threshold: f32) -> Result<Vec<Article>> {
        let articles = self.fetcher.try_fetch(source).await?;
        match query {
            Some(query) => self.ranker.rank(articles, query, threshold).await,
            None => Ok(articles),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Source, SourceCatalog};
    use crate::test_support::{feed_route, rss, spawn, Item};
    use axum::{http::StatusCode, routing::get, Router};
    use ss_inference::embeddings::HashingEmbedder;

    const OUTLETS: [&str; 9] = [
        "GMA",
        "Daily Inquirer",
        "Manila Bulletin",
        "ABS-CBN",
        "Rappler",
        "Philstar",
        "Manila Times",
        "BusinessWorld",
        "The Daily Tribune",
    ];

    fn aggregator(base: &str, paths: &[(&str, &str)]) -> Aggregator {
        let sources = paths
            .iter()
            .map(|(name, path)| Source::new(*name, format!("{}{}", base, path)))
            .collect();
        let catalog = Arc::new(SourceCatalog::new(sources).unwrap());
        Aggregator::new(
            Arc::new(FeedFetcher::new(catalog).unwrap()),
            Arc::new(EmbeddingRanker::new(Arc::new(HashingEmbedder::default()))),
        )
    }

    #[tokio::test]
    async fn test_all_sources_empty() {
        let app = Router::new().route("/empty", feed_route(rss(&[])));
        let base = spawn(app).await;
        let paths: Vec<(&str, &str)> = OUTLETS.iter().map(|name| (*name, "/empty")).collect();
        let aggregator = aggregator(&base, &paths);

        assert!(aggregator.collect(None, DEFAULT_THRESHOLD).await.is_empty());
        assert!(aggregator.collect(Some("typhoon"), DEFAULT_THRESHOLD).await.is_empty());
    }

    #[tokio::test]
    async fn test_same_story_from_two_sources_kept_once() {
        let typhoon = Item::new("Typhoon hits Luzon", "https://news.ph/typhoon", "Signal no. 4");
        let app = Router::new()
            .route(
                "/gma",
                feed_route(rss(&[typhoon.clone(), Item::new("PBA finals tonight", "https://gma.ph/pba", "Ginebra")])),
            )
            .route("/inquirer", feed_route(rss(&[typhoon])));
        let base = spawn(app).await;
        let aggregator = aggregator(&base, &[("GMA", "/gma"), ("Daily Inquirer", "/inquirer")]);

        let articles = aggregator.collect(None, DEFAULT_THRESHOLD).await;
        assert_eq!(articles.len(), 2);
        let typhoons: Vec<_> = articles.iter().filter(|a| a.title == "Typhoon hits Luzon").collect();
        assert_eq!(typhoons.len(), 1);
        assert_eq!(typhoons[0].source, "GMA");
    }

    #[tokio::test]
    async fn test_same_title_other_link_is_not_duplicate() {
        let app = Router::new()
            .route("/a", feed_route(rss(&[Item::new("Typhoon hits Luzon", "https://a.ph/1", "")])))
            .route("/b", feed_route(rss(&[Item::new("Typhoon hits Luzon", "https://b.ph/1", "")])));
        let base = spawn(app).await;
        let aggregator = aggregator(&base, &[("GMA", "/a"), ("Rappler", "/b")]);

        let sources: Vec<_> = aggregator
            .collect(None, DEFAULT_THRESHOLD)
            .await
            .into_iter()
            .map(|a| a.source)
            .collect();
        assert_eq!(sources, vec!["GMA", "Rappler"]);
    }

    #[tokio::test]
    async fn test_failing_source_is_isolated() {
        let app = Router::new()
            .route("/down", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/ok", feed_route(rss(&[Item::new("Senate opens budget hearings", "https://p.ph/1", "")])))
            .route("/broken", get(|| async { "<html>not a feed</html>" }));
        let base = spawn(app).await;
        let aggregator = aggregator(&base, &[("ABS-CBN", "/down"), ("Philstar", "/ok"), ("BusinessWorld", "/broken")]);

        let articles = aggregator.collect(None, DEFAULT_THRESHOLD).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source, "Philstar");
    }

    #[tokio::test]
    async fn test_query_keeps_catalog_order() {
        let app = Router::new()
            .route(
                "/gma",
                feed_route(rss(&[
                    Item::new("PBA finals tonight", "https://gma.ph/pba", "Ginebra faces San Miguel"),
                    Item::new("Typhoon update", "https://gma.ph/t", "Residents evacuate"),
                ])),
            )
            .route(
                "/rappler",
                feed_route(rss(&[Item::new("Typhoon hits Luzon", "https://rappler.com/t", "Signal raised over northern Luzon")])),
            );
        let base = spawn(app).await;
        let aggregator = aggregator(&base, &[("GMA", "/gma"), ("Rappler", "/rappler")]);

        let articles = aggregator.collect(Some(" typhoon luzon "), DEFAULT_THRESHOLD).await;
        let sources: Vec<_> = articles.iter().map(|a| a.source.as_str()).collect();
        assert_eq!(sources, vec!["GMA", "Rappler"]);
        assert_eq!(articles[0].title, "Typhoon update");
        assert!(articles.iter().all(|a| a.similarity.unwrap() >= DEFAULT_THRESHOLD));
        // The earlier source wins even when it scores lower
        assert!(articles[0].similarity.unwrap() < articles[1].similarity.unwrap());

        let limited = aggregator.collect_limited(Some("typhoon luzon"), DEFAULT_THRESHOLD, Some(1)).await;
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].source, "GMA");
    }

    #[tokio::test]
    async fn test_query_ranks_within_a_source() {
        let app = Router::new().route(
            "/gma",
            feed_route(rss(&[
                Item::new("Typhoon update", "https://gma.ph/t", "Residents evacuate"),
                Item::new("Typhoon hits Luzon", "https://gma.ph/l", "Signal raised over northern Luzon"),
            ])),
        );
        let base = spawn(app).await;
        let aggregator = aggregator(&base, &[("GMA", "/gma")]);

        let titles: Vec<_> = aggregator
            .collect(Some("typhoon luzon"), DEFAULT_THRESHOLD)
            .await
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["Typhoon hits Luzon", "Typhoon update"]);
    }
}
