//! AI client module for vision-model inference via OpenRouter.
//!
//! This module provides:
//! - `AiClient` trait, injected into the pipeline as `Arc<dyn AiClient>`
//! - `CachingAiClient` backed by `async-openai`, with an optional disk cache
//! - `FakeAiClient` for tests
//! - Prompt templates for the fridge and recipe-scan analyses
//!
//! # Configuration
//!
//! - `OPENROUTER_API_KEY` (required): Your OpenRouter API key
//! - `LARDER_AI_MODEL` (optional): Vision-capable model, e.g. "openai/gpt-4o-mini"
//! - `LARDER_AI_BASE_URL` (optional): API base URL
//! - `LARDER_AI_CACHE_DIR` (optional): Enables the response cache
//! - `LARDER_AI_OFFLINE` (optional): Set to "true" to use cache only
//! - `LARDER_AI_RATE_LIMIT_MS` (optional): Delay between requests in ms

mod cache;
mod client;
mod config;
mod fake;
pub mod prompts;
mod types;

pub use cache::{AiCache, CacheKey, CachedAiResponse};
pub use client::{complete_text, AiClient, AiError, CachingAiClient};
pub use config::{AiConfig, ConfigError};
pub use fake::{FakeAiClient, RecordedCall};
pub use types::{ChatMessage, ChatRequest, ChatResponse, Role, Usage};
