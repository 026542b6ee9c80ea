//! Chat model integration
//!
//! Provides:
//! - The `ChatModel` capability used by every pipeline stage
//! - Response JSON extraction and dual-unit usage accounting
//! - OpenAI-compatible and Google AI adapters behind one lazily built handle

mod cache;
mod googleai;
mod openai;
mod provider;
mod response;
mod traits;
mod usage;

pub use cache::{prompt_cache_key, CacheStats, ResponseCache};
pub use googleai::{GoogleAiChatModel, DEFAULT_GOOGLEAI_URL};
pub use openai::{OpenAiChatModel, DEFAULT_OPENAI_URL};
pub use provider::{build_chat_model, ModelSlot, ProviderKind};
pub use response::{count_non_whitespace, extract_json_block, ChatResponse};
pub use traits::ChatModel;
pub use usage::{
    parse_price, CostEstimate, ModelInfo, Price, PriceUnit, Stage, StageSeconds, StageUsage,
    UnitCounts, UnitPrice, Usage,
};
