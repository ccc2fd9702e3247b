use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::GeneratedArticle;

use super::provider::ArticleProvider;
use super::synthetic;
use super::text::{split_non_blank, strip_heading, strip_quotes, truncate_chars};

pub const CHAT_TITLE_MAX: usize = 150;

const PROMPT: &str = "Write a short blog post about recent technology innovations. Format: First line is the title, then 2-3 paragraphs of content.";
const REFERER: &str = "http://localhost:3001";
const APP_TITLE: &str = "Auto Blog Generator";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenRouter chat-completions API.
pub struct OpenRouterProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenRouterProvider {
    pub fn new(endpoint: String, api_key: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            endpoint,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl ArticleProvider for OpenRouterProvider {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    async fn attempt(&self) -> Result<GeneratedArticle> {
        tracing::info!("[AI] Attempting OpenRouter with model: {}", self.model);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: PROMPT.to_string(),
            }],
            max_tokens: 400,
            temperature: 0.7,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .header("HTTP-Referer", REFERER)
            .header("X-Title", APP_TITLE)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "OpenRouter returned {status}: {}",
                truncate_chars(&error_text, 300)
            )));
        }

        let chat: ChatResponse = response.json().await?;
        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AppError::Provider("OpenRouter returned no content".to_string()))?;

        let (first, body) = split_non_blank(&text);
        let title = truncate_chars(&strip_quotes(&strip_heading(&first)), CHAT_TITLE_MAX);
        let content = if body.is_empty() {
            synthetic::paragraphs(2)
        } else {
            body
        };

        tracing::info!("[AI] OpenRouter success: {}...", truncate_chars(&title, 50));
        Ok(GeneratedArticle { title, content })
    }
}
