//! OpenAI-compatible chat completions adapter (OpenAI, vLLM, ...)

use super::cache::{prompt_cache_key, ResponseCache};
use super::{ChatModel, ChatResponse, ModelInfo};
use crate::config::ModelConfig;
use crate::error::{DietQaError, Result};
use crate::http::{build_http_client, send_json};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

/// Chat model served by an OpenAI-compatible `/v1/chat/completions` endpoint
pub struct OpenAiChatModel {
    http_client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    info: ModelInfo,
    cache: Option<ResponseCache>,
}

impl OpenAiChatModel {
    /// Create from configuration
    ///
    /// The API key may only be omitted when `base_url` points at a
    /// self-hosted server.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let model = config.require_model()?.to_string();
        let api_key = match config.base_url {
            Some(_) => config.api_key.clone().filter(|k| !k.is_empty()),
            None => Some(config.require_api_key()?.to_string()),
        };
        let base = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_URL)
            .trim_end_matches('/');

        let name = match config.base_url {
            Some(_) => format!("{} on {}", model, base),
            None => format!("{} on OpenAI", model),
        };

        Ok(Self {
            http_client: build_http_client(config.timeout_secs)?,
            url: format!("{}/v1/chat/completions", base),
            model,
            api_key,
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            info: ModelInfo::new(name, config.price.resolve()?),
            cache: config.cache.then(ResponseCache::new),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct CompletionUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn send_message(&self, prompt: &str) -> Result<ChatResponse> {
        let cache_key = prompt_cache_key(&self.model, prompt);
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(&cache_key)) {
            tracing::debug!("Cache hit for chat completion");
            return Ok(cached);
        }

        let start = Instant::now();
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
        };

        let mut req = self.http_client.post(&self.url).json(&request);
        if let Some(ref api_key) = self.api_key {
            req = req.bearer_auth(api_key);
        }

        let completion: CompletionResponse = send_json(req, "Chat completion").await?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DietQaError::ExternalService("No response from model".to_string()))?;
        let usage = completion.usage.unwrap_or_default();

        tracing::debug!(
            "Chat completion in {:?} ({} prompt tokens, {} completion tokens)",
            start.elapsed(),
            usage.prompt_tokens,
            usage.completion_tokens
        );

        let response = ChatResponse::from_completion(
            prompt,
            text,
            usage.prompt_tokens,
            usage.completion_tokens,
        );
        if let Some(ref cache) = self.cache {
            cache.set(cache_key, response.clone());
            let stats = cache.stats();
            tracing::debug!(
                active = stats.active_entries,
                expired = stats.expired_entries,
                "Cached chat completion response"
            );
        }
        Ok(response)
    }

    fn info(&self) -> &ModelInfo {
        &self.info
    }
}
