use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::error::{AppError, Result};
use crate::models::Article;

pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// Read-only client for the public article endpoints.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .user_agent("autoblog-reader/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_articles(&self) -> Result<Vec<Article>> {
        let response = self
            .client
            .get(format!("{}/articles", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Api(format!(
                "Failed to load articles: HTTP {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    /// `Ok(None)` when the server has no article with this id.
    pub async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let response = self
            .client
            .get(format!("{}/articles/{}", self.base_url, id))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(AppError::Api(format!(
                "Failed to load article {id}: HTTP {status}"
            ))),
        }
    }
}
