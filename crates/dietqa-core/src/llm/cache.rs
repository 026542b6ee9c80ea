//! In-memory cache of model responses keyed by model and prompt

use super::ChatResponse;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

#[derive(Clone)]
struct CacheEntry {
    response: ChatResponse,
    expires_at: SystemTime,
}

/// Process-lifetime response cache shared by one adapter
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    /// Create new cache with default TTL of 1 hour
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(3600))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Cached response if present and not expired
    pub fn get(&self, key: &str) -> Option<ChatResponse> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;

        if SystemTime::now() < entry.expires_at {
            Some(entry.response.clone())
        } else {
            None
        }
    }

    /// Store a response, dropping every expired entry first
    pub fn set(&self, key: String, response: ChatResponse) {
        let now = SystemTime::now();
        let entry = CacheEntry {
            response,
            expires_at: now + self.ttl,
        };

        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, entry| now < entry.expires_at);
            entries.insert(key, entry);
        }
    }

    pub fn stats(&self) -> CacheStats {
        if let Ok(entries) = self.entries.read() {
            let now = SystemTime::now();
            let total = entries.len();
            let expired = entries.values().filter(|e| now >= e.expires_at).count();

            CacheStats {
                total_entries: total,
                expired_entries: expired,
                active_entries: total - expired,
            }
        } else {
            CacheStats::default()
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

/// Cache key for a prompt sent to a model
pub fn prompt_cache_key(model: &str, prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update([0u8]);
    hasher.update(prompt.as_bytes());
    format!("chat:{}:{:x}", model, hasher.finalize())
}
