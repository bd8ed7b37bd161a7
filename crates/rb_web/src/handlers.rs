use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rb_core::{Article, ArticlePatch, Error, NewArticle};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::AppState;

/// Maps pipeline and store errors onto HTTP statuses with a `{"message"}` body.
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            err if err.is_transport() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("❌ Request failed: {}", self.0);
        }
        (status, Json(json!({ "message": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Serialize)]
pub struct ScrapeResponse {
    pub count: usize,
    pub articles: Vec<Article>,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_articles(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Article>>> {
    Ok(Json(state.storage.list().await?))
}

pub async fn create_article(
    State(state): State<Arc<AppState>>,
    Json(article): Json<NewArticle>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    article.validate()?;
    let created = state.storage.create(article).await?;
    info!("💾 Created article {}", created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn scrape_articles(State(state): State<Arc<AppState>>) -> ApiResult<Json<ScrapeResponse>> {
    let articles = state.manager.scrape().await?;
    Ok(Json(ScrapeResponse {
        count: articles.len(),
        articles,
    }))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Article>> {
    Ok(Json(state.storage.get_by_id(&id).await?))
}

pub async fn update_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<ArticlePatch>,
) -> ApiResult<Json<Article>> {
    Ok(Json(state.storage.update_by_id(&id, patch).await?))
}

pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.storage.delete_by_id(&id).await?;
    info!("🗑️ Deleted article {}", id);
    Ok(StatusCode::NO_CONTENT)
}
