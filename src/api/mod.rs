mod articles;
mod error;
mod guard;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use articles::GenerateResponse;
pub use error::{ApiError, ApiResult};
pub use guard::{GenerateLimiter, API_KEY_HEADER};

use crate::ai::ArticleGenerator;
use crate::config::Config;
use crate::db::ArticleStore;
use crate::error::Result;

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: ArticleStore,
    pub generator: Arc<ArticleGenerator>,
    pub limiter: Arc<GenerateLimiter>,
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(store: ArticleStore, generator: Arc<ArticleGenerator>, config: &Config) -> Result<Self> {
        Ok(Self {
            store,
            generator,
            limiter: Arc::new(GenerateLimiter::per_hour(config.generate_rate_limit_per_hour)?),
            api_key: config.api_key.as_deref().map(Arc::from),
        })
    }
}

pub fn router(state: AppState) -> Router {
    // Layers run outside-in: the rate limit is checked before the key.
    let generate = Router::new()
        .route("/articles/generate", post(articles::generate_article))
        .route_layer(middleware::from_fn_with_state(state.clone(), guard::require_api_key))
        .route_layer(middleware::from_fn_with_state(state.clone(), guard::rate_limit));

    Router::new()
        .route("/", get(health_check))
        .route("/articles", get(articles::list_articles))
        .route("/articles/:id", get(articles::get_article))
        .route("/articles/generate", get(articles::lookup_generate))
        .merge(generate)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Auto blog backend is running" }))
}
