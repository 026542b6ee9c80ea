//! Summarize-and-annotate flow

use super::progress::{
    emit, ProgressSink, ProgressSnapshot, StreamEvent, STREAM_CHANNEL_CAPACITY,
};
use super::{clean_speech, require_question, Pipeline, SummarizeSpeechResult};
use crate::align::apply_annotation;
use crate::error::{DietQaError, Result};
use crate::llm::{Stage, StageSeconds, StageUsage};
use crate::prompts::{annotation_prompt, summary_prompt, ANNOTATED_KEY, SUMMARY_KEY};
use std::time::Instant;
use tokio::sync::mpsc;

impl Pipeline {
    /// Extract the parts of `speech` relevant to `question` and mark them in place
    pub async fn summarize_and_annotate(
        &self,
        question: &str,
        speech: &str,
    ) -> Result<SummarizeSpeechResult> {
        self.run_summarize_and_annotate(question, speech, None).await
    }

    /// Same as `summarize_and_annotate`, reporting progress on the returned channel
    pub fn summarize_and_annotate_stream(
        &self,
        question: impl Into<String>,
        speech: impl Into<String>,
    ) -> mpsc::Receiver<StreamEvent<SummarizeSpeechResult>> {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let pipeline = self.clone();
        let question = question.into();
        let speech = speech.into();

        tokio::spawn(async move {
            let event = match pipeline
                .run_summarize_and_annotate(&question, &speech, Some(&tx))
                .await
            {
                Ok(result) => StreamEvent::Finished(result),
                Err(e) => StreamEvent::Failed(e),
            };
            let _ = tx.send(event).await;
        });

        rx
    }

    async fn run_summarize_and_annotate(
        &self,
        question: &str,
        speech: &str,
        sink: ProgressSink<'_, SummarizeSpeechResult>,
    ) -> Result<SummarizeSpeechResult> {
        require_question(question)?;
        if speech.trim().is_empty() {
            return Err(DietQaError::InvalidInput("Speech text is empty".to_string()));
        }

        let info = self.model_info().clone();
        let mut usage = StageUsage::new();
        let mut seconds = StageSeconds::new();

        emit(
            sink,
            ProgressSnapshot::new("Summarizing...", &usage, &seconds).with_model_info(&info),
        )
        .await;

        let start = Instant::now();
        let response = self
            .model
            .send_message(&summary_prompt(&clean_speech(speech), question))
            .await?;
        let summary = response.require_str(Stage::Summarize, SUMMARY_KEY)?;
        usage.insert(Stage::Summarize, response.usage);
        seconds.insert(Stage::Summarize, start.elapsed().as_secs_f64());
        tracing::info!(
            "Summarized {} chars into {} chars",
            speech.chars().count(),
            summary.chars().count()
        );

        emit(
            sink,
            ProgressSnapshot::new("Annotating...", &usage, &seconds)
                .with_model_info(&info)
                .with_summary(&summary),
        )
        .await;

        let start = Instant::now();
        let response = self
            .model
            .send_message(&annotation_prompt(speech, &summary))
            .await?;
        let marked = response.require_str(Stage::Annotate, ANNOTATED_KEY)?;
        let annotated = apply_annotation(speech, &marked);
        usage.insert(Stage::Annotate, response.usage);
        seconds.insert(Stage::Annotate, start.elapsed().as_secs_f64());
        tracing::info!("Annotated speech in {:.2}s", seconds[&Stage::Annotate]);

        Ok(SummarizeSpeechResult {
            cost: self.cost(&usage),
            chat_model_info: info,
            summary,
            annotated,
            usage,
            seconds,
        })
    }
}
