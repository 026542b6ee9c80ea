//! Google AI (Gemini) `generateContent` adapter

use super::cache::{prompt_cache_key, ResponseCache};
use super::{ChatModel, ChatResponse, ModelInfo};
use crate::config::ModelConfig;
use crate::error::{DietQaError, Result};
use crate::http::{build_http_client, send_json};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub const DEFAULT_GOOGLEAI_URL: &str = "https://generativelanguage.googleapis.com";

/// Speeches quote heated debate; the default filters block too much of it.
const SAFETY_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HARASSMENT",
];

pub struct GoogleAiChatModel {
    http_client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    info: ModelInfo,
    cache: Option<ResponseCache>,
}

impl GoogleAiChatModel {
    /// Create from configuration; model and API key are both required
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let model = config.require_model()?.to_string();
        let api_key = config.require_api_key()?.to_string();
        let base = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_GOOGLEAI_URL)
            .trim_end_matches('/');

        Ok(Self {
            http_client: build_http_client(config.timeout_secs)?,
            url: format!("{}/v1beta/models/{}:generateContent", base, model),
            info: ModelInfo::new(format!("{} on Google AI", model), config.price.resolve()?),
            model,
            api_key,
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            cache: config.cache.then(ResponseCache::new),
        })
    }
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        Some(text)
    }
}

#[async_trait]
impl ChatModel for GoogleAiChatModel {
    async fn send_message(&self, prompt: &str) -> Result<ChatResponse> {
        let cache_key = prompt_cache_key(&self.model, prompt);
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(&cache_key)) {
            tracing::debug!("Cache hit for generateContent");
            return Ok(cached);
        }

        let start = Instant::now();
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                top_p: self.top_p,
                max_output_tokens: self.max_tokens,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "OFF",
                })
                .collect(),
        };

        let req = self
            .http_client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request);

        let mut generated: GenerateResponse = send_json(req, "Google AI").await?;
        let usage = generated.usage_metadata.take().unwrap_or_default();
        let text = generated
            .into_text()
            .ok_or_else(|| DietQaError::ExternalService("No candidate from model".to_string()))?;

        tracing::debug!(
            "generateContent in {:?} ({} prompt tokens, {} candidate tokens)",
            start.elapsed(),
            usage.prompt_token_count,
            usage.candidates_token_count
        );

        let response = ChatResponse::from_completion(
            prompt,
            text,
            usage.prompt_token_count,
            usage.candidates_token_count,
        );
        if let Some(ref cache) = self.cache {
            cache.set(cache_key, response.clone());
            let stats = cache.stats();
            tracing::debug!(
                active = stats.active_entries,
                expired = stats.expired_entries,
                "Cached generateContent response"
            );
        }
        Ok(response)
    }

    fn info(&self) -> &ModelInfo {
        &self.info
    }
}
