//! Chat model capability

use super::{ChatResponse, ModelInfo};
use crate::error::Result;
use async_trait::async_trait;

/// Send a prompt, get text, its JSON payload and usage
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one user prompt and wait for the full response
    async fn send_message(&self, prompt: &str) -> Result<ChatResponse>;

    /// Model identity and pricing
    fn info(&self) -> &ModelInfo;
}
