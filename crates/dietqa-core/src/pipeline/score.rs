//! Search-and-score flow

use super::progress::{
    emit, ProgressSink, ProgressSnapshot, StreamEvent, STREAM_CHANNEL_CAPACITY,
};
use super::{clean_speech, require_question, Pipeline, ScoredSpeech, SearchSpeechesResult};
use crate::error::{DietQaError, Result};
use crate::llm::{Stage, StageSeconds, StageUsage, Usage};
use crate::prompts::{query_suggestion_prompt, relevance_score_prompt, QUERIES_KEY, SCORE_KEY};
use crate::search::{search_speeches, QueryMatch};
use crate::splitter::{split_speech, WindowFilter};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::time::Instant;
use tokio::sync::mpsc;

/// Turn search hits into scoring candidates
///
/// Speeches longer than `max_len` characters are replaced by their windows;
/// shorter ones pass through whole with no window range.
pub fn expand_candidates(
    speeches: Vec<QueryMatch>,
    max_len: usize,
    filter: WindowFilter,
) -> Vec<ScoredSpeech> {
    let mut candidates = Vec::with_capacity(speeches.len());

    for speech in speeches {
        let speech_length = speech.record.speech_length();
        if speech_length <= max_len {
            candidates.push(ScoredSpeech {
                speech,
                score: 0.0,
                speech_length,
                window: None,
            });
            continue;
        }

        for window in split_speech(&speech.record.speech, &speech.queries, max_len, filter) {
            let mut part = speech.clone();
            part.record.speech = window.text;
            candidates.push(ScoredSpeech {
                speech: part,
                score: 0.0,
                speech_length,
                window: Some((window.start, window.end)),
            });
        }
    }

    candidates
}

impl Pipeline {
    /// Generate queries, search, window and score; highest score first
    pub async fn search_and_score(&self, question: &str) -> Result<SearchSpeechesResult> {
        self.run_search_and_score(question, None).await
    }

    /// Same as `search_and_score`, reporting progress on the returned channel
    pub fn search_and_score_stream(
        &self,
        question: impl Into<String>,
    ) -> mpsc::Receiver<StreamEvent<SearchSpeechesResult>> {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let pipeline = self.clone();
        let question = question.into();

        tokio::spawn(async move {
            let event = match pipeline.run_search_and_score(&question, Some(&tx)).await {
                Ok(result) => StreamEvent::Finished(result),
                Err(e) => StreamEvent::Failed(e),
            };
            let _ = tx.send(event).await;
        });

        rx
    }

    async fn run_search_and_score(
        &self,
        question: &str,
        sink: ProgressSink<'_, SearchSpeechesResult>,
    ) -> Result<SearchSpeechesResult> {
        require_question(question)?;
        let info = self.model_info().clone();
        let mut usage = StageUsage::new();
        let mut seconds = StageSeconds::new();

        emit(
            sink,
            ProgressSnapshot::new("Generating search queries...", &usage, &seconds)
                .with_model_info(&info),
        )
        .await;

        let start = Instant::now();
        let response = self
            .model
            .send_message(&query_suggestion_prompt(question, self.options.query_count))
            .await?;
        let queries = response.require_str_array(Stage::Queries, QUERIES_KEY)?;
        usage.insert(Stage::Queries, response.usage);
        seconds.insert(Stage::Queries, start.elapsed().as_secs_f64());
        tracing::info!("Generated {} queries: {:?}", queries.len(), queries);

        emit(
            sink,
            ProgressSnapshot::new("Searching speeches...", &usage, &seconds)
                .with_model_info(&info)
                .with_queries(&queries),
        )
        .await;

        let outcome = search_speeches(self.archive.as_ref(), &queries, &self.options.search).await?;
        seconds.insert(Stage::Search, outcome.seconds);

        let mut speeches = outcome.speeches;
        speeches.truncate(self.options.max_count);
        let mut candidates = expand_candidates(
            speeches,
            self.options.max_speech_length,
            self.options.window_filter,
        );

        emit(
            sink,
            ProgressSnapshot::new(
                format!("Scoring {} speeches...", candidates.len()),
                &usage,
                &seconds,
            )
            .with_model_info(&info)
            .with_queries(&queries)
            .with_speeches_length(candidates.len()),
        )
        .await;

        let start = Instant::now();
        let scored = self.score_candidates(&candidates, question).await?;
        let mut score_usage = Usage::default();
        for (candidate, (score, call_usage)) in candidates.iter_mut().zip(scored) {
            candidate.score = score;
            score_usage += call_usage;
        }
        usage.insert(Stage::Score, score_usage);
        seconds.insert(Stage::Score, start.elapsed().as_secs_f64());
        tracing::info!(
            "Scored {} candidates in {:.2}s",
            candidates.len(),
            seconds[&Stage::Score]
        );

        emit(
            sink,
            ProgressSnapshot::new(
                format!("Ranking {} speeches...", candidates.len()),
                &usage,
                &seconds,
            )
            .with_model_info(&info)
            .with_queries(&queries)
            .with_speeches_length(candidates.len()),
        )
        .await;

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ok(SearchSpeechesResult {
            cost: self.cost(&usage),
            chat_model_info: info,
            queries,
            speeches: candidates,
            usage,
            seconds,
        })
    }

    /// Score every candidate concurrently; results come back in candidate order
    async fn score_candidates(
        &self,
        candidates: &[ScoredSpeech],
        question: &str,
    ) -> Result<Vec<(f64, Usage)>> {
        let prompts: Vec<String> = candidates
            .iter()
            .map(|c| relevance_score_prompt(&clean_speech(&c.speech.record.speech), question))
            .collect();
        let calls: Vec<_> = prompts
            .into_iter()
            .map(|prompt| {
                let model = self.model.clone();
                async move {
                    let response = model.send_message(&prompt).await?;
                    let score = response.require_score(Stage::Score, SCORE_KEY)?;
                    Ok::<_, DietQaError>((score, response.usage))
                }
            })
            .collect();

        match self.options.score_concurrency {
            Some(limit) => {
                stream::iter(calls)
                    .buffered(limit.max(1))
                    .try_collect()
                    .await
            }
            None => futures::future::try_join_all(calls).await,
        }
    }
}
