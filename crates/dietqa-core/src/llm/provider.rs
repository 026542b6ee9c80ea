//! Provider selection and the once-initialized model handle

use super::{ChatModel, GoogleAiChatModel, OpenAiChatModel};
use crate::config::ModelConfig;
use crate::error::{DietQaError, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Supported chat model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    GoogleAi,
}

impl FromStr for ProviderKind {
    type Err = DietQaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "googleai" => Ok(ProviderKind::GoogleAi),
            other => Err(DietQaError::Config(format!(
                "Unknown model provider: \"{}\" (expected \"openai\" or \"googleai\")",
                other
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => f.write_str("openai"),
            ProviderKind::GoogleAi => f.write_str("googleai"),
        }
    }
}

/// Build the adapter selected by `config.provider`
pub fn build_chat_model(config: &ModelConfig) -> Result<Arc<dyn ChatModel>> {
    let model: Arc<dyn ChatModel> = match config.provider_kind()? {
        ProviderKind::OpenAi => Arc::new(OpenAiChatModel::new(config)?),
        ProviderKind::GoogleAi => Arc::new(GoogleAiChatModel::new(config)?),
    };
    tracing::info!("Chat model ready: {}", model.info().name);
    Ok(model)
}

/// Lazily built, process-lifetime chat model
///
/// The adapter is constructed on the first successful `get` and every later
/// call returns the same instance. A failed construction is not cached.
pub struct ModelSlot {
    config: ModelConfig,
    cell: OnceCell<Arc<dyn ChatModel>>,
}

impl ModelSlot {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// Slot that already holds a model
    pub fn with_model(config: ModelConfig, model: Arc<dyn ChatModel>) -> Self {
        Self {
            config,
            cell: OnceCell::new_with(Some(model)),
        }
    }

    pub async fn get(&self) -> Result<Arc<dyn ChatModel>> {
        self.cell
            .get_or_try_init(|| async { build_chat_model(&self.config) })
            .await
            .map(Arc::clone)
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}
