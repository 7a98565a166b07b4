use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use reqwest::Client;
use scraper::Html;
use ss_core::{Article, Error, Result};
use tracing::{debug, warn};
use crate::catalog::SourceCatalog;

/// Several outlets refuse requests without a browser-like agent.
pub const USER_AGENT: &str = "Mozilla/5.0";
const FEED_TIMEOUT_SECS: u64 = 30;

/// Turns a catalog name into the list of articles its feed currently holds.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    catalog: Arc<SourceCatalog>,
}

impl FeedFetcher {
    pub fn new(catalog: Arc<SourceCatalog>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(FEED_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, catalog })
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    /// Fetch and parse a source's feed, surfacing every failure.
    pub async fn try_fetch(&self, source: &str) -> Result<Vec<Article>> {
        let url = self
            .catalog
            .url(source)
            .ok_or_else(|| Error::UnknownSource(source.to_string()))?;

        debug!("Fetching {} feed from {}", source, url);
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        parse_feed(source, &bytes)
    }

    /// Like [`try_fetch`](Self::try_fetch), but any failure yields no articles.
    pub async fn fetch(&self, source: &str) -> Vec<Article> {
        match self.try_fetch(source).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!("Could not fetch {}: {}", source, e);
                Vec::new()
            }
        }
    }

    /// Entries whose title or summary contains `keyword`, ignoring case.
    pub async fn fetch_matching(&self, source: &str, keyword: &str) -> Vec<Article> {
        let articles = self.fetch(source).await;
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return articles;
        }
        articles
            .into_iter()
            .filter(|a| {
                a.title.to_lowercase().contains(&keyword) || a.summary.to_lowercase().contains(&keyword)
            })
            .collect()
    }
}

/// Parse an RSS or Atom document into articles attributed to `source`.
pub fn parse_feed(source: &str, bytes: &[u8]) -> Result<Vec<Article>> {
    let feed = feed_rs::parser::parse(bytes)
        .map_err(|e| Error::Feed(format!("{}: {}", source, e)))?;
    Ok(feed
        .entries
        .into_iter()
        .map(|entry| entry_to_article(source, entry))
        .collect())
}

fn entry_to_article(source: &str, entry: feed_rs::model::Entry) -> Article {
    let title = entry
        .title
        .map(|t| collapse_whitespace(&t.content))
        .unwrap_or_default();

    let summary = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .map(|html| strip_html(&html))
        .unwrap_or_default();

    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))
        .unwrap_or_default();

    let published_at = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.with_timezone(&Utc));

    Article {
        source: source.to_string(),
        title,
        summary,
        link,
        published_at,
        similarity: None,
    }
}

/// Feed summaries are often HTML snippets; keep only their text.
pub(crate) fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
