use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

pub const DEFAULT_OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_HF_API_URL: &str = "https://api-inference.huggingface.co";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_provider")]
    pub ai_provider: String,
    pub ai_api_url: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_local_model_path: Option<String>,

    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
    #[serde(default = "default_openrouter_model")]
    pub openrouter_model: String,
    #[serde(default = "default_openrouter_api_url")]
    pub openrouter_api_url: String,
    #[serde(default = "default_hf_model")]
    pub hf_model: String,
    #[serde(default = "default_hf_api_url")]
    pub hf_api_url: String,

    /// Shared secret for `POST /articles/generate`. `None` disables the check.
    pub api_key: Option<String>,

    #[serde(default = "default_rate_limit")]
    pub generate_rate_limit_per_hour: u32,

    #[serde(default = "default_seed_minimum")]
    pub seed_minimum: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("autoblog")
        .join("data.db")
        .to_string_lossy()
        .to_string()
}

fn default_provider() -> String {
    "synthetic".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}

fn default_openrouter_model() -> String {
    "google/gemma-2-9b-it:free".to_string()
}

fn default_openrouter_api_url() -> String {
    DEFAULT_OPENROUTER_API_URL.to_string()
}

fn default_hf_model() -> String {
    "mistralai/Mistral-7B-Instruct-v0.2".to_string()
}

fn default_hf_api_url() -> String {
    DEFAULT_HF_API_URL.to_string()
}

fn default_rate_limit() -> u32 {
    5
}

fn default_seed_minimum() -> u32 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            ai_provider: default_provider(),
            ai_api_url: None,
            ai_api_key: None,
            ai_local_model_path: None,
            ollama_model: default_ollama_model(),
            openrouter_model: default_openrouter_model(),
            openrouter_api_url: default_openrouter_api_url(),
            hf_model: default_hf_model(),
            hf_api_url: default_hf_api_url(),
            api_key: None,
            generate_rate_limit_per_hour: default_rate_limit(),
            seed_minimum: default_seed_minimum(),
        }
    }
}

/// Environment variables read on top of the config file. Values are kept as
/// strings so an empty `PORT=` in a `.env` file means "unset" rather than a
/// parse failure.
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    host: Option<String>,
    port: Option<String>,
    db_path: Option<String>,
    ai_provider: Option<String>,
    ai_api_url: Option<String>,
    ai_api_key: Option<String>,
    ai_local_model_path: Option<String>,
    ollama_model: Option<String>,
    openrouter_model: Option<String>,
    openrouter_api_url: Option<String>,
    hf_model: Option<String>,
    hf_api_url: Option<String>,
    api_key: Option<String>,
    generate_rate_limit_per_hour: Option<String>,
    seed_minimum: Option<String>,
}

impl Config {
    /// Config file (if present) overlaid with `.env` and the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_file(&Self::config_path())?;
        let overrides: EnvOverrides = envy::from_env()?;
        config.with_overrides(overrides)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Applies `(NAME, value)` pairs the same way `load` applies the environment.
    pub fn with_env<I>(self, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let overrides: EnvOverrides = envy::from_iter(vars)?;
        self.with_overrides(overrides)
    }

    fn with_overrides(mut self, env: EnvOverrides) -> Result<Self> {
        fn set(target: &mut String, value: Option<String>) {
            if let Some(v) = non_empty(value) {
                *target = v;
            }
        }
        fn set_opt(target: &mut Option<String>, value: Option<String>) {
            if let Some(v) = non_empty(value) {
                *target = Some(v);
            }
        }

        set(&mut self.host, env.host);
        set(&mut self.db_path, env.db_path);
        set(&mut self.ai_provider, env.ai_provider);
        set_opt(&mut self.ai_api_url, env.ai_api_url);
        set_opt(&mut self.ai_api_key, env.ai_api_key);
        set_opt(&mut self.ai_local_model_path, env.ai_local_model_path);
        set(&mut self.ollama_model, env.ollama_model);
        set(&mut self.openrouter_model, env.openrouter_model);
        set(&mut self.openrouter_api_url, env.openrouter_api_url);
        set(&mut self.hf_model, env.hf_model);
        set(&mut self.hf_api_url, env.hf_api_url);
        set_opt(&mut self.api_key, env.api_key);

        if let Some(port) = non_empty(env.port) {
            self.port = parse_number("PORT", &port)?;
        }
        if let Some(limit) = non_empty(env.generate_rate_limit_per_hour) {
            self.generate_rate_limit_per_hour = parse_number("GENERATE_RATE_LIMIT_PER_HOUR", &limit)?;
        }
        if let Some(min) = non_empty(env.seed_minimum) {
            self.seed_minimum = parse_number("SEED_MINIMUM", &min)?;
        }

        // An empty key in the config file is the same as no key at all.
        self.api_key = non_empty(self.api_key.take());
        self.ai_api_key = non_empty(self.ai_api_key.take());
        self.ai_api_url = non_empty(self.ai_api_url.take());

        if self.generate_rate_limit_per_hour == 0 {
            return Err(AppError::Config(
                "GENERATE_RATE_LIMIT_PER_HOUR must be greater than zero".to_string(),
            ));
        }

        Ok(self)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("autoblog")
            .join("config.toml")
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| AppError::Config(format!("{name} is not a valid number: {value:?}")))
}
