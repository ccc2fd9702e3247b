mod huggingface;
mod local;
mod ollama;
mod openrouter;
mod provider;
mod synthetic;
mod text;

use std::path::PathBuf;

pub use huggingface::{HuggingFaceProvider, INFERENCE_TITLE_MAX};
pub use local::{LocalModel, LocalProvider, SamplingParams, LOCAL_TITLE_MAX};
pub use ollama::OllamaProvider;
pub use openrouter::{OpenRouterProvider, CHAT_TITLE_MAX};
pub use provider::{ArticleProvider, ProviderKind};
pub use synthetic::synthetic_article;

use crate::config::Config;
use crate::models::GeneratedArticle;

/// Produces one article per call by walking the configured providers in
/// order and falling back to synthetic text. Never fails.
pub struct ArticleGenerator {
    selection: String,
    providers: Vec<Box<dyn ArticleProvider>>,
}

impl ArticleGenerator {
    pub fn from_config(config: &Config) -> Self {
        let mut providers: Vec<Box<dyn ArticleProvider>> = Vec::new();

        for kind in ProviderKind::parse_selection(&config.ai_provider) {
            match kind {
                ProviderKind::Local => {
                    let path = config.ai_local_model_path.as_ref().map(PathBuf::from);
                    providers.push(Box::new(LocalProvider::new(path)));
                }
                ProviderKind::Ollama => match &config.ai_api_url {
                    Some(url) => match OllamaProvider::new(url, config.ollama_model.clone()) {
                        Ok(provider) => providers.push(Box::new(provider)),
                        Err(e) => tracing::warn!("[AI] Ollama disabled: {}", e),
                    },
                    None => tracing::warn!("[AI] Ollama selected but AI_API_URL is not set"),
                },
                ProviderKind::OpenRouter => match &config.ai_api_key {
                    Some(key) => providers.push(Box::new(OpenRouterProvider::new(
                        config.openrouter_api_url.clone(),
                        key.clone(),
                        config.openrouter_model.clone(),
                    ))),
                    None => tracing::warn!("[AI] OpenRouter selected but AI_API_KEY is not set"),
                },
                ProviderKind::HuggingFace => match &config.ai_api_key {
                    Some(key) => providers.push(Box::new(HuggingFaceProvider::new(
                        &config.hf_api_url,
                        key.clone(),
                        config.hf_model.clone(),
                    ))),
                    None => tracing::warn!("[AI] Hugging Face selected but AI_API_KEY is not set"),
                },
                ProviderKind::Synthetic => {}
            }
        }

        Self {
            selection: config.ai_provider.clone(),
            providers,
        }
    }

    pub fn with_providers(selection: impl Into<String>, providers: Vec<Box<dyn ArticleProvider>>) -> Self {
        Self {
            selection: selection.into(),
            providers,
        }
    }

    pub fn synthetic_only() -> Self {
        Self::with_providers(ProviderKind::Synthetic.label(), Vec::new())
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn generate(&self) -> GeneratedArticle {
        tracing::info!("[AI] Provider: {}", self.selection);

        for provider in &self.providers {
            match provider.attempt().await {
                Ok(article) if article.title.trim().is_empty() => {
                    tracing::warn!("[AI] {} returned an empty title, falling back", provider.name());
                }
                Ok(mut article) => {
                    if article.content.trim().is_empty() {
                        article.content = synthetic::paragraphs(2);
                    }
                    return article;
                }
                Err(e) => {
                    tracing::warn!("[AI] {} failed, falling back: {}", provider.name(), e);
                }
            }
        }

        tracing::info!("[AI] Using synthetic fallback");
        synthetic_article()
    }
}
