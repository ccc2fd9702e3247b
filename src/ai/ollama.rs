use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::GeneratedArticle;

use super::provider::ArticleProvider;
use super::text::{split_first_line, strip_heading};

const PROMPT: &str =
    "Write a concise blog post about recent technology innovations. Format: Title on first line, then content.";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Self-hosted Ollama server (`POST {base}/api/generate`).
pub struct OllamaProvider {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model: String) -> Result<Self> {
        let endpoint = Url::parse(&format!("{}/api/generate", base_url.trim_end_matches('/')))
            .map_err(|e| AppError::Config(format!("invalid AI_API_URL {base_url:?}: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            model,
        })
    }
}

#[async_trait]
impl ArticleProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn attempt(&self) -> Result<GeneratedArticle> {
        tracing::info!("[AI] Attempting Ollama at {}", self.endpoint);

        let request = GenerateRequest {
            model: &self.model,
            prompt: PROMPT,
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!("Ollama returned {status}: {error_text}")));
        }

        let body: GenerateResponse = response.json().await?;
        let text = body
            .response
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::Provider("Ollama returned no text".to_string()))?;

        let (first, content) = split_first_line(&text);
        Ok(GeneratedArticle {
            title: strip_heading(&first),
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_title_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "llama3.2",
                "stream": false
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r###"{"response":"## Edge AI Arrives\n\nFirst paragraph.\n\nSecond paragraph."}"###)
            .expect(1)
            .create_async()
            .await;

        let provider = OllamaProvider::new(&server.url(), "llama3.2".to_string()).unwrap();
        let article = provider.attempt().await.unwrap();

        assert_eq!(article.title, "Edge AI Arrives");
        assert_eq!(article.content, "First paragraph.\n\nSecond paragraph.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_is_a_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/generate")
            .with_status(500)
            .with_body("model not found")
            .create_async()
            .await;

        let provider = OllamaProvider::new(&server.url(), "llama3.2".to_string()).unwrap();
        assert!(provider.attempt().await.is_err());
    }

    #[tokio::test]
    async fn missing_response_field_is_a_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"done":true}"#)
            .create_async()
            .await;

        let provider = OllamaProvider::new(&server.url(), "llama3.2".to_string()).unwrap();
        assert!(provider.attempt().await.is_err());
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(OllamaProvider::new("not a url", "llama3.2".to_string()).is_err());
    }
}
