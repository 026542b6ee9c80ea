//! Shared request plumbing for the archive and chat providers

use crate::error::{DietQaError, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub(crate) fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(DietQaError::Http)
}

/// Send a prepared request and decode a JSON body, mapping non-2xx to an error
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    service: &str,
) -> Result<T> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(DietQaError::ExternalService(format!(
            "{} error (HTTP {}): {}",
            service, status, body
        )));
    }

    Ok(response.json().await?)
}
