use std::sync::Arc;
use ss_agent::{ArticleQa, ReactAgent, ToolRegistry};
use ss_core::InferenceModel;
use ss_feeds::Aggregator;

pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub qa: Arc<ArticleQa>,
    pub model: Arc<dyn InferenceModel>,
    pub tools: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(aggregator: Arc<Aggregator>, qa: Arc<ArticleQa>, model: Arc<dyn InferenceModel>) -> Self {
        let tools = Arc::new(ToolRegistry::news_tools(aggregator.clone(), qa.clone()));
        Self {
            aggregator,
            qa,
            model,
            tools,
        }
    }

    /// HTTP chat is stateless: each request gets an agent without history.
    pub fn agent(&self) -> ReactAgent {
        let catalog = self.aggregator.fetcher().catalog();
        ReactAgent::new(self.model.clone(), self.tools.clone(), &catalog.names())
    }
}
