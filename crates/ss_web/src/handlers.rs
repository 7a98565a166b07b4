use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use ss_agent::AgentReply;
use ss_core::Article;
use ss_feeds::{aggregator, ranker, Source};
use tracing::error;
use crate::AppState;

pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

fn known_source(state: &AppState, source: &str) -> Result<(), ApiError> {
    let catalog = state.aggregator.fetcher().catalog();
    if catalog.contains(source) {
        Ok(())
    } else {
        Err(ApiError(
            StatusCode::NOT_FOUND,
            format!("Unknown source '{}'. Available: {}", source, catalog.names().join(", ")),
        ))
    }
}

pub async fn list_sources(State(state): State<Arc<AppState>>) -> Json<Vec<Source>> {
    Json(state.aggregator.fetcher().catalog().sources().to_vec())
}

#[derive(Debug, Deserialize)]
pub struct KeywordParams {
    pub keyword: Option<String>,
}

pub async fn source_news(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
    Query(params): Query<KeywordParams>,
) -> Result<Json<Vec<Article>>, ApiError> {
    known_source(&state, &source)?;
    let fetcher = state.aggregator.fetcher();
    let articles = match params.keyword {
        Some(keyword) => fetcher.fetch_matching(&source, &keyword).await,
        None => fetcher.fetch(&source).await,
    };
    Ok(Json(articles))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub threshold: Option<f32>,
}

pub async fn search_news(
    State(state): State<Arc<AppState>>,
    Path(source): Path<String>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Article>>, ApiError> {
    known_source(&state, &source)?;
    let articles = state.aggregator.fetcher().fetch(&source).await;
    let threshold = params.threshold.unwrap_or(ranker::DEFAULT_THRESHOLD);
    state
        .aggregator
        .ranker()
        .rank(articles, &params.q, threshold)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Ranking {} failed: {}", source, e);
            ApiError(StatusCode::BAD_GATEWAY, e.to_string())
        })
}

#[derive(Debug, Deserialize)]
pub struct LatestParams {
    pub q: Option<String>,
    pub threshold: Option<f32>,
    pub limit: Option<usize>,
}

pub async fn latest_news(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LatestParams>,
) -> Json<Vec<Article>> {
    let threshold = params.threshold.unwrap_or(aggregator::DEFAULT_THRESHOLD);
    Json(
        state
            .aggregator
            .collect_limited(params.q.as_deref(), threshold, params.limit)
            .await,
    )
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub url: String,
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

pub async fn ask(State(state): State<Arc<AppState>>, Json(request): Json<AskRequest>) -> Json<AskResponse> {
    let answer = state.qa.answer(&request.question, &request.url).await;
    Json(AskResponse { answer })
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<AgentReply>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError(StatusCode::BAD_REQUEST, "Message is empty".to_string()));
    }
    state.agent().chat(&request.message).await.map(Json).map_err(|e| {
        error!("Chat failed: {}", e);
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}
