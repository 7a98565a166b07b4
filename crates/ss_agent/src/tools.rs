use std::sync::Arc;
use async_trait::async_trait;
use serde_json::Value;
use ss_core::Article;
use ss_feeds::{aggregator, ranker, Aggregator};
use tracing::{debug, warn};
use crate::qa::ArticleQa;

/// Something the agent can call by name with JSON arguments.
///
/// Tools never fail: errors come back as text the model can read.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn call(&self, input: Value) -> String;
}

/// Looks up a string argument. A bare string input stands for `primary`.
fn string_arg(input: &Value, key: &str, primary: &str) -> Option<String> {
    let value = match input {
        Value::String(s) if key == primary => Some(s.as_str()),
        Value::Object(map) => map.get(key).and_then(Value::as_str),
        _ => None,
    };
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn threshold_arg(input: &Value, default: f32) -> f32 {
    input
        .get("threshold")
        .and_then(|v| v.as_f64().or_else(|| v.as_str()?.trim().parse().ok()))
        .map(|t| t as f32)
        .unwrap_or(default)
}

fn missing(tool: &str, key: &str) -> String {
    format!("Error: {} needs a '{}' argument", tool, key)
}

fn to_observation(articles: &[Article]) -> String {
    serde_json::to_string(articles).unwrap_or_else(|e| format!("Error: could not encode articles: {}", e))
}

pub struct LatestSpecificNews {
    aggregator: Arc<Aggregator>,
}

impl LatestSpecificNews {
    pub const NAME: &'static str = "get_latest_specific_news";

    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self { aggregator }
    }
}

#[async_trait]
impl Tool for LatestSpecificNews {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Latest headlines from one news outlet. \
         Arguments: {\"source\": outlet name, \"keyword\": optional word the title or summary must contain}."
    }

    async fn call(&self, input: Value) -> String {
        let Some(source) = string_arg(&input, "source", "source") else {
            return missing(Self::NAME, "source");
        };
        let fetcher = self.aggregator.fetcher();
        let articles = match string_arg(&input, "keyword", "source") {
            Some(keyword) => fetcher.fetch_matching(&source, &keyword).await,
            None => fetcher.fetch(&source).await,
        };
        to_observation(&articles)
    }
}

pub struct SearchLatestNews {
    aggregator: Arc<Aggregator>,
}

impl SearchLatestNews {
    pub const NAME: &'static str = "search_latest_news";

    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self { aggregator }
    }
}

#[async_trait]
impl Tool for SearchLatestNews {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Recent headlines from one outlet that match a topic, best match first. \
         Arguments: {\"source\": outlet name, \"query\": topic, \"threshold\": optional minimum similarity (default 0.3)}."
    }

    async fn call(&self, input: Value) -> String {
        let Some(source) = string_arg(&input, "source", "source") else {
            return missing(Self::NAME, "source");
        };
        let Some(query) = string_arg(&input, "query", "source") else {
            return missing(Self::NAME, "query");
        };
        let threshold = threshold_arg(&input, ranker::DEFAULT_THRESHOLD);

        let articles = self.aggregator.fetcher().fetch(&source).await;
        match self.aggregator.ranker().rank(articles, &query, threshold).await {
            Ok(ranked) => to_observation(&ranked),
            Err(e) => {
                warn!("Ranking {} for '{}' failed: {}", source, query, e);
                format!("Error: could not rank news from {}: {}", source, e)
            }
        }
    }
}

pub struct LatestGeneralNews {
    aggregator: Arc<Aggregator>,
}

impl LatestGeneralNews {
    pub const NAME: &'static str = "get_latest_general_news";

    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self { aggregator }
    }
}

#[async_trait]
impl Tool for LatestGeneralNews {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Latest headlines across every outlet, optionally filtered by topic. \
         Arguments: {\"query\": optional topic, \"threshold\": optional minimum similarity (default 0.25)}."
    }

    async fn call(&self, input: Value) -> String {
        let query = string_arg(&input, "query", "query");
        let threshold = threshold_arg(&input, aggregator::DEFAULT_THRESHOLD);
        to_observation(&self.aggregator.collect(query.as_deref(), threshold).await)
    }
}

pub struct UrlBasedQa {
    qa: Arc<ArticleQa>,
}

impl UrlBasedQa {
    pub const NAME: &'static str = "url_based_qa";

    pub fn new(qa: Arc<ArticleQa>) -> Self {
        Self { qa }
    }
}

#[async_trait]
impl Tool for UrlBasedQa {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Use when the user gives an article URL and asks about it. \
         Arguments: {\"query\": the question, \"url\": the article URL}. \
         Example: \"Based on https://example.com/article, which areas were affected by the typhoon?\""
    }

    async fn call(&self, input: Value) -> String {
        let Some(url) = string_arg(&input, "url", "url") else {
            return missing(Self::NAME, "url");
        };
        let Some(query) = string_arg(&input, "query", "url") else {
            return missing(Self::NAME, "query");
        };
        self.qa.answer(&query, &url).await
    }
}

/// The tools offered to the agent, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four news tools over one aggregator and one article QA pipeline.
    pub fn news_tools(aggregator: Arc<Aggregator>, qa: Arc<ArticleQa>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LatestSpecificNews::new(aggregator.clone())));
        registry.register(Arc::new(SearchLatestNews::new(aggregator.clone())));
        registry.register(Arc::new(LatestGeneralNews::new(aggregator)));
        registry.register(Arc::new(UrlBasedQa::new(qa)));
        registry
    }

    /// Adds `tool`, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub async fn call(&self, name: &str, input: Value) -> String {
        match self.get(name.trim()) {
            Some(tool) => {
                debug!("Calling {} with {}", name, input);
                tool.call(input).await
            }
            None => format!(
                "Error: unknown tool '{}'. Valid tools: {}",
                name.trim(),
                self.names().join(", ")
            ),
        }
    }
}
