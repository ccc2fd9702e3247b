use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::models::Article;

use super::error::{ApiError, ApiResult};
use super::AppState;

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub article: Article,
}

pub async fn list_articles(State(state): State<AppState>) -> ApiResult<Json<Vec<Article>>> {
    let articles = state.store.list_all().await?;
    Ok(Json(articles))
}

fn invalid_id() -> ApiError {
    ApiError::BadRequest("Invalid article id".to_string())
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Article>> {
    let id: i64 = id.trim().parse().map_err(|_| invalid_id())?;

    state
        .store
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Article not found".to_string()))
}

/// `GET /articles/generate` is an id lookup for "generate", which never parses.
pub async fn lookup_generate() -> ApiError {
    invalid_id()
}

pub async fn generate_article(State(state): State<AppState>) -> ApiResult<Json<GenerateResponse>> {
    let generated = state.generator.generate().await;
    let article = state.store.insert(generated).await?;
    tracing::info!("Manually generated article {}: {}", article.id, article.title);

    Ok(Json(GenerateResponse {
        success: true,
        article,
    }))
}
