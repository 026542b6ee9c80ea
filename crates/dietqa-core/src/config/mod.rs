//! Configuration management

use crate::error::{DietQaError, Result};
use crate::llm::{parse_price, Price, PriceUnit, ProviderKind, UnitPrice};
use crate::splitter::WindowFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default speech search endpoint of the National Diet Library
pub const DEFAULT_ARCHIVE_URL: &str = "https://kokkai.ndl.go.jp/api/speech";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Chat model configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Speech archive configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Chat model provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider key: "openai" or "googleai"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier, required by every provider
    #[serde(default = "default_model", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// API key for the provider
    #[serde(default = "default_api_key", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override for the provider base URL (e.g. a vLLM server for "openai")
    #[serde(default = "default_base_url", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Cache identical prompts in memory for the process lifetime
    #[serde(default = "default_true")]
    pub cache: bool,

    #[serde(default)]
    pub price: PriceConfig,
}

impl ModelConfig {
    pub fn provider_kind(&self) -> Result<ProviderKind> {
        self.provider.parse()
    }

    /// Model identifier, or a configuration error naming the provider
    pub fn require_model(&self) -> Result<&str> {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| {
                DietQaError::Config(format!(
                    "No model configured for provider \"{}\" (set DIETQA_MODEL)",
                    self.provider
                ))
            })
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                DietQaError::Config(format!(
                    "No API key configured for provider \"{}\" (set DIETQA_API_KEY)",
                    self.provider
                ))
            })
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: default_api_key(),
            base_url: default_base_url(),
            timeout_secs: default_model_timeout(),
            temperature: 0.0,
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            cache: true,
            price: PriceConfig::default(),
        }
    }
}

fn default_provider() -> String {
    env_non_empty("DIETQA_MODEL_PROVIDER").unwrap_or_else(|| "openai".to_string())
}

fn default_model() -> Option<String> {
    env_non_empty("DIETQA_MODEL")
}

fn default_api_key() -> Option<String> {
    env_non_empty("DIETQA_API_KEY")
}

fn default_base_url() -> Option<String> {
    env_non_empty("DIETQA_LLM_URL")
}

fn default_model_timeout() -> u64 {
    120
}

fn default_top_p() -> f32 {
    0.95
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_true() -> bool {
    true
}

/// Provider price list, as written in config or environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceConfig {
    /// "tokens" or "not_whitespace_characters"
    #[serde(default = "default_price_unit")]
    pub unit: String,

    /// USD per input unit, e.g. "0.15/1_000_000"
    #[serde(default = "default_price_in", skip_serializing_if = "Option::is_none")]
    pub usd_per_unit_in: Option<String>,

    /// USD per output unit
    #[serde(default = "default_price_out", skip_serializing_if = "Option::is_none")]
    pub usd_per_unit_out: Option<String>,
}

impl PriceConfig {
    /// Price when both directions are configured, `None` otherwise
    pub fn resolve(&self) -> Result<Option<Price>> {
        let unit: PriceUnit = self.unit.parse()?;
        let input = self.usd_per_unit_in.as_deref().and_then(parse_price);
        let output = self.usd_per_unit_out.as_deref().and_then(parse_price);

        Ok(match (input, output) {
            (Some(input), Some(output)) => Some(Price {
                unit,
                unit_usd: UnitPrice { input, output },
            }),
            _ => None,
        })
    }
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            unit: default_price_unit(),
            usd_per_unit_in: default_price_in(),
            usd_per_unit_out: default_price_out(),
        }
    }
}

fn default_price_unit() -> String {
    env_non_empty("DIETQA_PRICE_UNIT").unwrap_or_else(|| "tokens".to_string())
}

fn default_price_in() -> Option<String> {
    env_non_empty("DIETQA_PRICE_USD_PER_UNIT_IN")
}

fn default_price_out() -> Option<String> {
    env_non_empty("DIETQA_PRICE_USD_PER_UNIT_OUT")
}

/// Speech archive configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Speech search endpoint
    #[serde(default = "default_archive_url")]
    pub base_url: String,

    /// `maximumRecords` sent with every query
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    /// Issue all queries at once instead of one at a time
    #[serde(default)]
    pub concurrent: bool,

    /// Request timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_archive_url(),
            max_records: default_max_records(),
            concurrent: false,
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_archive_url() -> String {
    env_non_empty("DIETQA_ARCHIVE_URL").unwrap_or_else(|| DEFAULT_ARCHIVE_URL.to_string())
}

fn default_max_records() -> usize {
    30
}

fn default_search_timeout() -> u64 {
    30
}

/// Pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Speeches kept after the archive search
    #[serde(default = "default_max_count")]
    pub max_count: usize,

    /// Speeches longer than this many characters are scored in windows
    #[serde(default = "default_max_speech_length")]
    pub max_speech_length: usize,

    /// Number of queries requested from the model
    #[serde(default = "default_query_count")]
    pub query_count: usize,

    #[serde(default)]
    pub window_filter: WindowFilter,

    /// Cap on in-flight scoring calls; unset scores every candidate at once
    #[serde(default)]
    pub score_concurrency: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_count: default_max_count(),
            max_speech_length: default_max_speech_length(),
            query_count: default_query_count(),
            window_filter: WindowFilter::default(),
            score_concurrency: None,
        }
    }
}

fn default_max_count() -> usize {
    50
}

fn default_max_speech_length() -> usize {
    1000
}

fn default_query_count() -> usize {
    5
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load config from `DIETQA_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::resolved_path())
    }

    /// `DIETQA_CONFIG` when set, otherwise the default path
    pub fn resolved_path() -> PathBuf {
        env_non_empty("DIETQA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_path)
    }

    /// Load config from a file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Copy safe to print: the API key is masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.model.api_key.is_some() {
            config.model.api_key = Some("********".to_string());
        }
        config
    }
}
