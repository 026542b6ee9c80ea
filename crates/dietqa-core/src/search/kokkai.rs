//! HTTP client for the National Diet Library speech API

use super::{ArchiveResponse, SpeechArchive};
use crate::config::SearchConfig;
use crate::error::{DietQaError, Result};
use crate::http::{build_http_client, send_json};
use async_trait::async_trait;

/// Upper bound the archive accepts for `maximumRecords`
const MAX_RECORDS_LIMIT: usize = 100;

pub struct KokkaiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl KokkaiClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            http_client: build_http_client(config.timeout_secs)?,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SpeechArchive for KokkaiClient {
    async fn fetch(&self, query: &str, max_records: usize) -> Result<ArchiveResponse> {
        if !(1..=MAX_RECORDS_LIMIT).contains(&max_records) {
            return Err(DietQaError::InvalidInput(format!(
                "maximumRecords must be between 1 and {}, got {}",
                MAX_RECORDS_LIMIT, max_records
            )));
        }

        let max_records = max_records.to_string();
        let req = self.http_client.get(&self.base_url).query(&[
            ("any", query),
            ("recordPacking", "json"),
            ("maximumRecords", max_records.as_str()),
        ]);

        send_json(req, "Speech archive").await
    }
}
