//! Question-answering pipeline
//!
//! Two flows share one `Pipeline`:
//! - search and score: query generation → archive search → windowing → scoring
//! - summarize and annotate: summary extraction → span annotation → alignment
//!
//! Each flow runs to completion or streams progress over a channel.

pub mod clean;
pub mod progress;
mod score;
mod summarize;

pub use clean::clean_speech;
pub use progress::{drain_stream, ProgressSnapshot, StreamEvent, STREAM_CHANNEL_CAPACITY};
pub use score::expand_candidates;

use crate::config::Config;
use crate::error::{DietQaError, Result};
use crate::llm::{ChatModel, CostEstimate, ModelInfo, StageSeconds, StageUsage};
use crate::prompts::{DEFAULT_QUERY_COUNT, NO_MATCHING_SECTION};
use crate::search::{KokkaiClient, QueryMatch, SearchOptions, SpeechArchive};
use crate::splitter::WindowFilter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pipeline options
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Speeches kept after the archive search
    pub max_count: usize,
    /// Speeches longer than this many characters are scored in windows
    pub max_speech_length: usize,
    /// Number of queries requested from the model
    pub query_count: usize,
    pub window_filter: WindowFilter,
    /// Cap on in-flight scoring calls; `None` scores every candidate at once
    pub score_concurrency: Option<usize>,
    pub search: SearchOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_count: 50,
            max_speech_length: 1000,
            query_count: DEFAULT_QUERY_COUNT,
            window_filter: WindowFilter::default(),
            score_concurrency: None,
            search: SearchOptions::default(),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_count: config.pipeline.max_count,
            max_speech_length: config.pipeline.max_speech_length,
            query_count: config.pipeline.query_count,
            window_filter: config.pipeline.window_filter,
            score_concurrency: config.pipeline.score_concurrency,
            search: SearchOptions {
                max_records: config.search.max_records,
                concurrent: config.search.concurrent,
            },
        }
    }
}

/// A speech, or a window of one, with its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSpeech {
    #[serde(flatten)]
    pub speech: QueryMatch,
    /// Relevance in `[0, 100]`
    pub score: f64,
    /// Length of the whole original speech in characters
    pub speech_length: usize,
    /// Character range of this window; `None` for a whole speech
    pub window: Option<(usize, usize)>,
}

impl ScoredSpeech {
    pub fn is_window(&self) -> bool {
        self.window.is_some()
    }
}

/// Result of the search-and-score flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSpeechesResult {
    pub chat_model_info: ModelInfo,
    pub queries: Vec<String>,
    /// Highest score first; equal scores keep search order
    pub speeches: Vec<ScoredSpeech>,
    pub usage: StageUsage,
    pub seconds: StageSeconds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostEstimate>,
}

/// Result of the summarize-and-annotate flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeSpeechResult {
    pub chat_model_info: ModelInfo,
    pub summary: String,
    /// Original speech with `<u>` markers around the relevant spans
    pub annotated: String,
    pub usage: StageUsage,
    pub seconds: StageSeconds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostEstimate>,
}

impl SummarizeSpeechResult {
    /// False when the model reported that nothing in the speech applies
    pub fn has_matching_section(&self) -> bool {
        self.summary.trim() != NO_MATCHING_SECTION
    }
}

/// Drives the chat model and the speech archive for both flows
#[derive(Clone)]
pub struct Pipeline {
    model: Arc<dyn ChatModel>,
    archive: Arc<dyn SpeechArchive>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        model: Arc<dyn ChatModel>,
        archive: Arc<dyn SpeechArchive>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            model,
            archive,
            options,
        }
    }

    /// Pipeline over the configured archive endpoint
    pub fn from_config(config: &Config, model: Arc<dyn ChatModel>) -> Result<Self> {
        let archive = Arc::new(KokkaiClient::new(&config.search)?);
        Ok(Self::new(model, archive, PipelineOptions::from_config(config)))
    }

    pub fn model_info(&self) -> &ModelInfo {
        self.model.info()
    }

    fn cost(&self, usage: &StageUsage) -> Option<CostEstimate> {
        self.model_info()
            .price
            .as_ref()
            .map(|price| CostEstimate::from_usage(price, usage))
    }
}

fn require_question(question: &str) -> Result<()> {
    if question.trim().is_empty() {
        return Err(DietQaError::InvalidInput("Question is empty".to_string()));
    }
    Ok(())
}
