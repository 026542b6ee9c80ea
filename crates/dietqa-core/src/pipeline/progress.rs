//! Streaming progress protocol
//!
//! A streaming run sends any number of `Progress` snapshots followed by
//! exactly one terminal `Finished` or `Failed` event on the same channel.

use crate::error::{DietQaError, Result};
use crate::llm::{ModelInfo, StageSeconds, StageUsage};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Capacity of the channel returned by the streaming entry points
pub const STREAM_CHANNEL_CAPACITY: usize = 16;

/// Snapshot of a run in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub progress: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_model_info: Option<ModelInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speeches_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub usage: StageUsage,
    pub seconds: StageSeconds,
}

impl ProgressSnapshot {
    pub fn new(progress: impl Into<String>, usage: &StageUsage, seconds: &StageSeconds) -> Self {
        Self {
            progress: progress.into(),
            chat_model_info: None,
            queries: None,
            speeches_length: None,
            summary: None,
            usage: usage.clone(),
            seconds: seconds.clone(),
        }
    }

    pub fn with_model_info(mut self, info: &ModelInfo) -> Self {
        self.chat_model_info = Some(info.clone());
        self
    }

    pub fn with_queries(mut self, queries: &[String]) -> Self {
        self.queries = Some(queries.to_vec());
        self
    }

    pub fn with_speeches_length(mut self, len: usize) -> Self {
        self.speeches_length = Some(len);
        self
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }
}

/// One message of a streaming run
#[derive(Debug)]
pub enum StreamEvent<T> {
    Progress(ProgressSnapshot),
    Finished(T),
    Failed(DietQaError),
}

/// Where a run reports progress; `None` for the run-to-completion entry points
pub(crate) type ProgressSink<'a, T> = Option<&'a mpsc::Sender<StreamEvent<T>>>;

/// Send a snapshot if anyone is listening
///
/// A receiver that went away does not stop the run.
pub(crate) async fn emit<T>(sink: ProgressSink<'_, T>, snapshot: ProgressSnapshot) {
    tracing::debug!("Progress: {}", snapshot.progress);
    if let Some(tx) = sink {
        if tx.send(StreamEvent::Progress(snapshot)).await.is_err() {
            tracing::debug!("Progress receiver dropped; continuing");
        }
    }
}

/// Read a stream until its terminal event, handing each snapshot to `on_progress`
pub async fn drain_stream<T, F>(
    mut rx: mpsc::Receiver<StreamEvent<T>>,
    mut on_progress: F,
) -> Result<T>
where
    F: FnMut(&ProgressSnapshot),
{
    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::Progress(snapshot) => on_progress(&snapshot),
            StreamEvent::Finished(result) => return Ok(result),
            StreamEvent::Failed(err) => return Err(err),
        }
    }
    Err(DietQaError::Other(anyhow::anyhow!(
        "Stream closed before a final result"
    )))
}
