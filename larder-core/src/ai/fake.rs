//! Fake AI client for tests and offline development.
//!
//! Responses are matched by checking whether the prompt contains a registered
//! substring (case-insensitive), in registration order. Every call is recorded
//! so tests can assert how many inference calls a pipeline made.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

use super::client::{AiClient, AiError};
use super::types::{ChatRequest, ChatResponse, Usage};

/// One recorded call to the fake client.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt_name: String,
    pub prompt: String,
    pub image_urls: Vec<String>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Default)]
pub struct FakeAiClient {
    responses: Vec<(String, Result<String, String>)>,
    default_response: Option<String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeAiClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client answering prompts that contain `prompt_contains`.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        Self::new().respond(prompt_contains, response)
    }

    pub fn respond(mut self, prompt_contains: &str, response: &str) -> Self {
        self.responses
            .push((prompt_contains.to_lowercase(), Ok(response.to_string())));
        self
    }

    /// Make prompts containing `prompt_contains` fail with an API error.
    pub fn fail_on(mut self, prompt_contains: &str, message: &str) -> Self {
        self.responses
            .push((prompt_contains.to_lowercase(), Err(message.to_string())));
        self
    }

    /// Set the response used when no pattern matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl AiClient for FakeAiClient {
    async fn complete(
        &self,
        prompt_name: &str,
        request: ChatRequest,
    ) -> Result<ChatResponse, AiError> {
        let prompt = request
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let image_urls = request
            .messages
            .iter()
            .flat_map(|m| m.image_urls.iter().cloned())
            .collect();

        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                prompt_name: prompt_name.to_string(),
                prompt: prompt.clone(),
                image_urls,
                max_tokens: request.max_tokens,
            });

        let prompt_lower = prompt.to_lowercase();
        let matched = self
            .responses
            .iter()
            .find(|(pattern, _)| prompt_lower.contains(pattern))
            .map(|(_, response)| response.clone());

        let content = match (matched, &self.default_response) {
            (Some(Ok(content)), _) => content,
            (Some(Err(message)), _) => return Err(AiError::Api(message)),
            (None, Some(default)) => default.clone(),
            (None, None) => {
                return Err(AiError::Api(format!(
                    "FakeAiClient: no response configured for prompt (first 100 chars): {}",
                    prompt.chars().take(100).collect::<String>()
                )))
            }
        };

        Ok(ChatResponse {
            content,
            usage: Usage::default(),
            cached: false,
        })
    }
}
