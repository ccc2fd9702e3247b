use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::GeneratedArticle;

/// One way of producing an article. An `Err` means "try the next one".
#[async_trait]
pub trait ArticleProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self) -> Result<GeneratedArticle>;
}

/// Backends selectable through `AI_PROVIDER`, declared in attempt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderKind {
    Local,
    Ollama,
    OpenRouter,
    HuggingFace,
    Synthetic,
}

impl ProviderKind {
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Local => "local",
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::Synthetic => "synthetic",
        }
    }

    /// Parses a comma-separated selection into attempt order, skipping unknown names.
    pub fn parse_selection(selection: &str) -> Vec<ProviderKind> {
        let mut kinds: Vec<ProviderKind> = selection
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|name| match name.parse() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    tracing::warn!("[AI] Unknown provider {:?}, ignoring", name);
                    None
                }
            })
            .collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(ProviderKind::Local),
            "ollama" => Ok(ProviderKind::Ollama),
            "openrouter" => Ok(ProviderKind::OpenRouter),
            "huggingface" | "hf" => Ok(ProviderKind::HuggingFace),
            "synthetic" | "faker" => Ok(ProviderKind::Synthetic),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_selection() {
        assert_eq!(ProviderKind::parse_selection("ollama"), vec![ProviderKind::Ollama]);
        assert_eq!(ProviderKind::parse_selection("faker"), vec![ProviderKind::Synthetic]);
    }

    #[test]
    fn list_is_put_in_attempt_order() {
        assert_eq!(
            ProviderKind::parse_selection("huggingface, local,OpenRouter,local"),
            vec![
                ProviderKind::Local,
                ProviderKind::OpenRouter,
                ProviderKind::HuggingFace
            ]
        );
    }

    #[test]
    fn unknown_names_are_dropped() {
        assert!(ProviderKind::parse_selection("gpt-17").is_empty());
        assert!(ProviderKind::parse_selection("").is_empty());
    }
}
