//! AI configuration from environment variables.

use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Default OpenRouter base URL.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model. Must accept image input.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Default rate limit between requests in milliseconds.
pub const DEFAULT_RATE_LIMIT_MS: u64 = 0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// AI client configuration.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// API key for OpenRouter.
    pub api_key: String,
    /// Vision-capable model name (e.g., "openai/gpt-4o-mini").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Directory for caching responses. Caching is off when unset.
    pub cache_dir: Option<PathBuf>,
    /// If true, only use cache, error if not cached.
    pub offline: bool,
    /// Milliseconds to wait between requests.
    pub rate_limit_ms: u64,
}

impl AiConfig {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `OPENROUTER_API_KEY`
    ///
    /// Optional:
    /// - `LARDER_AI_MODEL` (default: "openai/gpt-4o-mini")
    /// - `LARDER_AI_BASE_URL` (default: "https://openrouter.ai/api/v1")
    /// - `LARDER_AI_CACHE_DIR`: enables the disk cache; "default" picks `~/.larder/ai-cache`
    /// - `LARDER_AI_OFFLINE`: use cache only (default: false)
    /// - `LARDER_AI_RATE_LIMIT_MS` (default: 0)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("OPENROUTER_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENROUTER_API_KEY".to_string()))?;

        let model = env::var("LARDER_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let base_url =
            env::var("LARDER_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let cache_dir = env::var("LARDER_AI_CACHE_DIR").ok().map(|v| {
            if v == "default" {
                Self::default_cache_dir()
            } else {
                PathBuf::from(v)
            }
        });

        let offline = env::var("LARDER_AI_OFFLINE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let rate_limit_ms = match env::var("LARDER_AI_RATE_LIMIT_MS") {
            Ok(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                name: "LARDER_AI_RATE_LIMIT_MS".to_string(),
                value: v,
            })?,
            Err(_) => DEFAULT_RATE_LIMIT_MS,
        };

        if offline && cache_dir.is_none() {
            return Err(ConfigError::InvalidValue {
                name: "LARDER_AI_OFFLINE".to_string(),
                value: "offline mode requires LARDER_AI_CACHE_DIR".to_string(),
            });
        }

        Ok(Self {
            api_key,
            model,
            base_url,
            cache_dir,
            offline,
            rate_limit_ms,
        })
    }

    /// Get the default cache directory: ~/.larder/ai-cache
    pub fn default_cache_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".larder").join("ai-cache"))
            .unwrap_or_else(|| PathBuf::from("data/ai-cache"))
    }
}
