//! Chat responses and the JSON payload convention shared by every prompt

use super::{Stage, UnitCounts, Usage};
use crate::error::{DietQaError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

lazy_static! {
    static ref JSON_BLOCK_RE: Regex = Regex::new(r"(?s)```json(.+?)```").unwrap();
}

/// Result of one `send_message` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Raw response text
    pub text: String,
    /// Object parsed from the first ```json block, empty when there is none
    pub json: Map<String, Value>,
    pub usage: Usage,
}

impl ChatResponse {
    /// Build a response from provider output, computing character counts locally
    pub fn from_completion(
        prompt: &str,
        text: impl Into<String>,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Self {
        let text = text.into();
        let json = extract_json_block(&text);
        let usage = Usage {
            input: UnitCounts {
                tokens: input_tokens,
                non_whitespace_characters: count_non_whitespace(prompt),
            },
            output: UnitCounts {
                tokens: output_tokens,
                non_whitespace_characters: count_non_whitespace(&text),
            },
        };

        Self { text, json, usage }
    }

    /// String value of `key`
    pub fn require_str(&self, stage: Stage, key: &'static str) -> Result<String> {
        self.json
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DietQaError::malformed(stage, key))
    }

    /// Array-of-strings value of `key`; any non-string element is malformed
    pub fn require_str_array(&self, stage: Stage, key: &'static str) -> Result<Vec<String>> {
        let arr = self
            .json
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| DietQaError::malformed(stage, key))?;

        arr.iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| DietQaError::malformed(stage, key))
    }

    /// Relevance score of `key`, clamped to `[0, 100]`
    ///
    /// Models often quote the number (`"score": "85"`), so numeric strings count.
    pub fn require_score(&self, stage: Stage, key: &'static str) -> Result<f64> {
        let score = match self.json.get(key) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|s| s.is_finite())
        .ok_or_else(|| DietQaError::malformed(stage, key))?;

        Ok(score.clamp(0.0, 100.0))
    }
}

/// Parse the first fenced ```json block of `text` into an object
pub fn extract_json_block(text: &str) -> Map<String, Value> {
    let Some(body) = JSON_BLOCK_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    else {
        return Map::new();
    };

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!("JSON block is not an object: {}", other);
            Map::new()
        }
        Err(e) => {
            tracing::warn!("Failed to parse JSON block from model response: {}", e);
            tracing::debug!("Raw model response: {}", text);
            Map::new()
        }
    }
}

/// Number of characters left after dropping all Unicode whitespace
pub fn count_non_whitespace(s: &str) -> u64 {
    s.chars().filter(|c| !c.is_whitespace()).count() as u64
}
