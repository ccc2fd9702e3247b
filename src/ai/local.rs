//! In-process completion model: a word-level Markov chain trained from a text
//! corpus. Loaded once, on first use.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use tokio::sync::OnceCell;

use crate::error::{AppError, Result};
use crate::models::GeneratedArticle;

use super::provider::ArticleProvider;
use super::text::truncate_chars;

pub const LOCAL_TITLE_MAX: usize = 100;

const BUILTIN_CORPUS: &str = include_str!("corpus.txt");
const TITLE_PROMPT: &str = "Blog Post Title: The Future of";
const TITLE_PREFIX: &str = "The Future of";
const BODY_LEAD: &str = "In today's rapidly evolving world,";
const BODY_FALLBACK: &str = "Technology continues to shape our lives in unprecedented ways.";

#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    pub max_new_tokens: usize,
    pub temperature: f64,
    pub top_k: usize,
}

impl SamplingParams {
    pub fn new(max_new_tokens: usize) -> Self {
        Self {
            max_new_tokens,
            temperature: 0.8,
            top_k: 50,
        }
    }
}

#[derive(Debug)]
pub struct LocalModel {
    transitions: HashMap<String, Vec<(String, u32)>>,
    openers: Vec<String>,
}

impl LocalModel {
    pub fn train(corpus: &str) -> Result<Self> {
        let tokens: Vec<&str> = corpus.split_whitespace().collect();
        if tokens.len() < 2 {
            return Err(AppError::LocalModel(
                "corpus needs at least two words".to_string(),
            ));
        }

        let mut counts: HashMap<String, HashMap<String, u32>> = HashMap::new();
        for pair in tokens.windows(2) {
            *counts
                .entry(key(pair[0]))
                .or_default()
                .entry(pair[1].to_string())
                .or_insert(0) += 1;
        }

        let mut openers: Vec<String> = std::iter::once(tokens[0])
            .chain(
                tokens
                    .windows(2)
                    .filter(|w| ends_sentence(w[0]))
                    .map(|w| w[1]),
            )
            .map(str::to_string)
            .collect();
        openers.dedup();

        let transitions = counts
            .into_iter()
            .map(|(word, next)| {
                let mut next: Vec<(String, u32)> = next.into_iter().collect();
                // Most frequent first; ties broken alphabetically for determinism
                next.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                (word, next)
            })
            .collect();

        Ok(Self {
            transitions,
            openers,
        })
    }

    pub fn vocabulary_size(&self) -> usize {
        self.transitions.len()
    }

    /// Continues `prompt` by up to `max_new_tokens` words. Returns only the new text.
    pub fn complete<R: Rng + ?Sized>(
        &self,
        prompt: &str,
        params: SamplingParams,
        rng: &mut R,
    ) -> String {
        let mut last = prompt.split_whitespace().last().map(str::to_string);
        let mut out: Vec<String> = Vec::with_capacity(params.max_new_tokens);

        for _ in 0..params.max_new_tokens {
            let next = last
                .as_deref()
                .and_then(|word| self.transitions.get(&key(word)))
                .and_then(|candidates| sample(candidates, params, rng))
                .unwrap_or_else(|| self.openers[rng.gen_range(0..self.openers.len())].clone());
            last = Some(next.clone());
            out.push(next);
        }

        out.join(" ")
    }
}

fn key(word: &str) -> String {
    word.to_lowercase()
}

fn ends_sentence(word: &str) -> bool {
    word.ends_with('.') || word.ends_with('!') || word.ends_with('?')
}

fn sample<R: Rng + ?Sized>(
    candidates: &[(String, u32)],
    params: SamplingParams,
    rng: &mut R,
) -> Option<String> {
    let top = &candidates[..candidates.len().min(params.top_k.max(1))];
    let temperature = params.temperature.max(0.05);
    let weights: Vec<f64> = top
        .iter()
        .map(|(_, count)| (*count as f64).powf(1.0 / temperature))
        .collect();
    let dist = WeightedIndex::new(&weights).ok()?;
    Some(top[dist.sample(rng)].0.clone())
}

/// Generates articles with a [`LocalModel`], loading it lazily.
pub struct LocalProvider {
    model_path: Option<PathBuf>,
    model: OnceCell<Arc<LocalModel>>,
}

impl LocalProvider {
    pub fn new(model_path: Option<PathBuf>) -> Self {
        Self {
            model_path,
            model: OnceCell::new(),
        }
    }

    pub async fn model(&self) -> Result<Arc<LocalModel>> {
        let model = self
            .model
            .get_or_try_init(|| async {
                tracing::info!("[AI] Loading local text generation model...");
                let path = self.model_path.clone();
                let model = tokio::task::spawn_blocking(move || load_model(path))
                    .await
                    .map_err(|e| AppError::LocalModel(format!("loader task failed: {e}")))??;
                tracing::info!(
                    "[AI] Local model ready ({} distinct words)",
                    model.vocabulary_size()
                );
                Ok::<_, AppError>(Arc::new(model))
            })
            .await?;
        Ok(Arc::clone(model))
    }
}

fn load_model(path: Option<PathBuf>) -> Result<LocalModel> {
    match path {
        Some(path) => {
            let corpus = std::fs::read_to_string(&path)?;
            LocalModel::train(&corpus)
        }
        None => LocalModel::train(BUILTIN_CORPUS),
    }
}

/// Title first, then a body seeded with that title.
pub fn compose_article<R: Rng + ?Sized>(model: &LocalModel, rng: &mut R) -> GeneratedArticle {
    let continuation = model.complete(TITLE_PROMPT, SamplingParams::new(20), rng);
    let full = format!("{TITLE_PREFIX} {}", continuation.trim());
    let first_line = full.lines().next().unwrap_or(TITLE_PREFIX).trim();
    let title = truncate_chars(first_line, LOCAL_TITLE_MAX);

    let body_prompt = format!("{title}\n\n{BODY_LEAD}");
    let body = model.complete(&body_prompt, SamplingParams::new(200), rng);
    let body = body.trim();
    let content = if body.is_empty() {
        BODY_FALLBACK.to_string()
    } else {
        body.to_string()
    };

    GeneratedArticle { title, content }
}

#[async_trait]
impl ArticleProvider for LocalProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn attempt(&self) -> Result<GeneratedArticle> {
        let model = self.model().await?;
        let article = compose_article(&model, &mut rand::thread_rng());
        tracing::info!(
            "[AI] Local model success: {}...",
            truncate_chars(&article.title, 50)
        );
        Ok(article)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn training_requires_some_text() {
        assert!(LocalModel::train("").is_err());
        assert!(LocalModel::train("lonely").is_err());
        assert!(LocalModel::train("two words").is_ok());
    }

    #[test]
    fn completion_follows_the_only_path() {
        let model = LocalModel::train("alpha beta gamma delta").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let out = model.complete("alpha", SamplingParams::new(3), &mut rng);
        assert_eq!(out, "beta gamma delta");
    }

    #[test]
    fn completion_produces_requested_length() {
        let model = LocalModel::train(BUILTIN_CORPUS).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let out = model.complete(TITLE_PROMPT, SamplingParams::new(20), &mut rng);
        assert_eq!(out.split_whitespace().count(), 20);
    }

    #[test]
    fn top_k_of_one_is_greedy() {
        let model = LocalModel::train("a b. a b. a c.").unwrap();
        let mut params = SamplingParams::new(1);
        params.top_k = 1;
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(model.complete("a", params, &mut rng), "b.");
        }
    }

    #[test]
    fn composed_article_has_title_and_body() {
        let model = LocalModel::train(BUILTIN_CORPUS).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let article = compose_article(&model, &mut rng);
        assert!(article.title.starts_with("The Future of "));
        assert!(article.title.chars().count() <= LOCAL_TITLE_MAX);
        assert!(!article.content.is_empty());
    }

    #[tokio::test]
    async fn model_loads_once() {
        let provider = LocalProvider::new(None);
        let first = provider.model().await.unwrap();
        let second = provider.model().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn model_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        std::fs::write(&path, "Rust makes systems programming fun. Rust is fast.").unwrap();

        let provider = LocalProvider::new(Some(path));
        let article = provider.attempt().await.unwrap();
        assert!(article.title.starts_with("The Future of"));
    }

    #[tokio::test]
    async fn missing_model_file_is_an_error() {
        let provider = LocalProvider::new(Some(PathBuf::from("/nonexistent/corpus.txt")));
        assert!(provider.attempt().await.is_err());
    }
}
