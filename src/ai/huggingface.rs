use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::GeneratedArticle;

use super::provider::ArticleProvider;
use super::synthetic;
use super::text::{split_non_blank, strip_heading, truncate_chars};

pub const INFERENCE_TITLE_MAX: usize = 100;

const PROMPT: &str =
    "Write a concise blog post about technology innovations. Include a title and 2-3 paragraphs.";

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: Parameters,
    options: Options,
}

#[derive(Debug, Serialize)]
struct Parameters {
    max_new_tokens: u32,
    temperature: f32,
    return_full_text: bool,
}

#[derive(Debug, Serialize)]
struct Options {
    wait_for_model: bool,
    use_cache: bool,
}

#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: Option<String>,
}

/// Hugging Face serverless inference (`POST {base}/models/{model}`).
pub struct HuggingFaceProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HuggingFaceProvider {
    pub fn new(base_url: &str, api_key: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            endpoint: format!("{}/models/{}", base_url.trim_end_matches('/'), model),
            api_key,
            model,
        }
    }
}

/// The API answers with `[{generated_text}]`, `{generated_text}` or a bare string
/// depending on the model.
fn extract_generated_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Array(items) => items
            .into_iter()
            .next()
            .and_then(|first| serde_json::from_value::<Generation>(first).ok())
            .and_then(|g| g.generated_text),
        other => serde_json::from_value::<Generation>(other)
            .ok()
            .and_then(|g| g.generated_text),
    }
}

#[async_trait]
impl ArticleProvider for HuggingFaceProvider {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    async fn attempt(&self) -> Result<GeneratedArticle> {
        tracing::info!("[AI] Attempting Hugging Face with model: {}", self.model);

        let request = InferenceRequest {
            inputs: PROMPT,
            parameters: Parameters {
                max_new_tokens: 250,
                temperature: 0.8,
                return_full_text: false,
            },
            options: Options {
                wait_for_model: true,
                use_cache: false,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "Hugging Face returned {status}: {}",
                truncate_chars(&error_text, 200)
            )));
        }

        let value: Value = response.json().await?;
        tracing::debug!("[AI] HF Response: {}", truncate_chars(&value.to_string(), 200));

        let generated = extract_generated_text(value)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::Provider("Hugging Face returned no text".to_string()))?;

        let text = generated.replacen(PROMPT, "", 1);
        let (first, body) = split_non_blank(text.trim());
        let first = if first.is_empty() {
            synthetic::catch_phrase()
        } else {
            first
        };
        let title = truncate_chars(&strip_heading(&first), INFERENCE_TITLE_MAX);
        let content = if body.is_empty() {
            synthetic::paragraphs(2)
        } else {
            body
        };

        tracing::info!("[AI] Hugging Face success: {}...", truncate_chars(&title, 50));
        Ok(GeneratedArticle { title, content })
    }
}
