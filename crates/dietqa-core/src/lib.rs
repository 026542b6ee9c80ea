//! dietqa Core Library
//!
//! Ask a question of the National Diet speech archive.
//!
//! # Features
//! - LLM-generated exact-match queries against the kokkai speech API
//! - Windowed relevance scoring of long speeches, fanned out concurrently
//! - Summary extraction and `<u>` span annotation re-aligned to the original text
//! - Token and non-whitespace-character usage accounting per stage
//! - Streaming progress over a channel

pub mod align;
pub mod config;
pub mod error;
pub(crate) mod http;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod search;
pub mod splitter;

pub use align::{apply_annotation, strip_markers};
pub use config::{Config, ModelConfig, PipelineConfig, PriceConfig, SearchConfig};
pub use error::{DietQaError, Error, Result};
pub use llm::{
    build_chat_model, ChatModel, ChatResponse, CostEstimate, ModelInfo, ModelSlot, ProviderKind,
    Stage, StageSeconds, StageUsage, Usage,
};
pub use pipeline::{
    clean_speech, drain_stream, Pipeline, PipelineOptions, ProgressSnapshot, ScoredSpeech,
    SearchSpeechesResult, StreamEvent, SummarizeSpeechResult,
};
pub use search::{
    search_speeches, KokkaiClient, QueryMatch, SearchOptions, SearchOutcome, SpeechArchive,
    SpeechRecord,
};
pub use splitter::{split_speech, split_windows, SpeechWindow, WindowFilter};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "dietqa";
