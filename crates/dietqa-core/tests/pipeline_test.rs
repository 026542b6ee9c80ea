//! End-to-end tests of both pipeline flows against scripted fakes

mod common;

use common::*;
use dietqa_core::llm::Stage;
use dietqa_core::{
    drain_stream, DietQaError, ModelConfig, ModelSlot, Pipeline, PipelineOptions, StreamEvent,
};
use std::sync::Arc;

const QUESTION: &str = "防衛費の財源はどうなっていますか";

fn archive() -> MemoryArchive {
    MemoryArchive::new(vec![
        (
            "予算 2024",
            vec![
                speech("a", "2024-03-01", "予算 2024年度について。点数=40"),
                chair_speech("c", "2024-03-05", "ただいまから会議を開きます。"),
                speech("b", "2024-02-01", "点数=90 予算 2024 と防衛費について。"),
            ],
        ),
        (
            "防衛費",
            vec![
                speech("b", "2024-02-01", "点数=90 予算 2024 と防衛費について。"),
                speech("d", "2024-03-01", "防衛費の話。点数=90"),
            ],
        ),
    ])
}

fn pipeline_with(
    model: ScriptedModel,
    archive: MemoryArchive,
    options: PipelineOptions,
) -> Pipeline {
    Pipeline::new(Arc::new(model), Arc::new(archive), options)
}

#[tokio::test]
async fn test_search_and_score_orders_by_score_then_search_order() {
    let pipeline = pipeline_with(ScriptedModel::new(), archive(), PipelineOptions::default());

    let result = pipeline.search_and_score(QUESTION).await.unwrap();

    assert_eq!(result.queries, vec!["予算 2024", "防衛費"]);
    assert_eq!(result.chat_model_info.name, "scripted on test");

    let ids: Vec<&str> = result
        .speeches
        .iter()
        .map(|s| s.speech.record.speech_id.as_str())
        .collect();
    // d and b tie at 90; d comes first in date order
    assert_eq!(ids, vec!["d", "b", "a"]);

    let scores: Vec<f64> = result.speeches.iter().map(|s| s.score).collect();
    assert_eq!(scores, vec![90.0, 90.0, 40.0]);

    let b = &result.speeches[1];
    assert_eq!(b.speech.queries, vec!["予算 2024", "防衛費"]);
    assert!(!b.is_window());
}

#[tokio::test]
async fn test_search_and_score_records_usage_per_stage() {
    let pipeline = pipeline_with(ScriptedModel::new(), archive(), PipelineOptions::default());

    let result = pipeline.search_and_score(QUESTION).await.unwrap();

    assert_eq!(result.usage[&Stage::Queries].input.tokens, INPUT_TOKENS);
    assert_eq!(result.usage[&Stage::Score].input.tokens, 3 * INPUT_TOKENS);
    assert_eq!(result.usage[&Stage::Score].output.tokens, 3 * OUTPUT_TOKENS);
    assert!(!result.usage.contains_key(&Stage::Search));

    for stage in [Stage::Queries, Stage::Search, Stage::Score] {
        assert!(result.seconds[&stage] >= 0.0, "missing seconds for {}", stage);
    }
    assert!(result.cost.is_none());
}

#[tokio::test]
async fn test_search_and_score_cost_when_priced() {
    let model = ScriptedModel::new().with_price(0.5, 2.0);
    let pipeline = pipeline_with(model, archive(), PipelineOptions::default());

    let result = pipeline.search_and_score(QUESTION).await.unwrap();
    let cost = result.cost.unwrap();

    assert_eq!(cost.input_units, 4 * INPUT_TOKENS);
    assert_eq!(cost.output_units, 4 * OUTPUT_TOKENS);
    assert!((cost.total_usd - (40.0 * 0.5 + 8.0 * 2.0)).abs() < 1e-9);
}

#[tokio::test]
async fn test_search_uses_each_query_with_max_records() {
    let archive = Arc::new(archive());
    let mut options = PipelineOptions::default();
    options.search.max_records = 7;
    let pipeline = Pipeline::new(Arc::new(ScriptedModel::new()), archive.clone(), options);

    pipeline.search_and_score(QUESTION).await.unwrap();

    let calls = archive.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![("予算 2024".to_string(), 7), ("防衛費".to_string(), 7)]
    );
}

#[tokio::test]
async fn test_max_count_truncates_before_scoring() {
    let model = Arc::new(ScriptedModel::new());
    let options = PipelineOptions {
        max_count: 1,
        ..PipelineOptions::default()
    };
    let pipeline = Pipeline::new(model.clone(), Arc::new(archive()), options);

    let result = pipeline.search_and_score(QUESTION).await.unwrap();

    assert_eq!(result.speeches.len(), 1);
    assert_eq!(result.speeches[0].speech.record.speech_id, "a");
    assert_eq!(model.prompts_containing(SCORE_PROMPT_MARK).len(), 1);
}

#[tokio::test]
async fn test_long_speech_is_scored_in_windows() {
    let text = format!("防衛費点数=70{}", "あ".repeat(32));
    let archive = MemoryArchive::new(vec![(
        "防衛費",
        vec![speech("long", "2024-01-10", &text)],
    )]);
    let options = PipelineOptions {
        max_speech_length: 20,
        ..PipelineOptions::default()
    };
    let pipeline = pipeline_with(ScriptedModel::new(), archive, options);

    let result = pipeline.search_and_score(QUESTION).await.unwrap();

    assert_eq!(result.speeches.len(), 1);
    let window = &result.speeches[0];
    assert_eq!(window.window, Some((0, 20)));
    assert_eq!(window.speech_length, 40);
    assert_eq!(window.score, 70.0);
    assert_eq!(window.speech.record.speech.chars().count(), 20);
    assert_eq!(window.speech.queries, vec!["防衛費"]);
}

#[tokio::test]
async fn test_missing_queries_key_is_malformed_output() {
    let mut model = ScriptedModel::new();
    model.queries_reply = json_block(r#"{"keywords": ["予算"]}"#);
    let pipeline = pipeline_with(model, archive(), PipelineOptions::default());

    let err = pipeline.search_and_score(QUESTION).await.unwrap_err();

    assert!(matches!(
        err,
        DietQaError::MalformedOutput {
            stage: Stage::Queries,
            key: "queries"
        }
    ));
}

#[tokio::test]
async fn test_unscorable_reply_fails_the_run() {
    let archive = MemoryArchive::new(vec![(
        "防衛費",
        vec![speech("x", "2024-01-10", "防衛費について述べます。")],
    )]);
    let pipeline = pipeline_with(ScriptedModel::new(), archive, PipelineOptions::default());

    let err = pipeline.search_and_score(QUESTION).await.unwrap_err();

    assert!(matches!(
        err,
        DietQaError::MalformedOutput {
            stage: Stage::Score,
            ..
        }
    ));
}

#[tokio::test]
async fn test_empty_question_is_rejected_before_any_call() {
    let model = Arc::new(ScriptedModel::new());
    let pipeline = Pipeline::new(model.clone(), Arc::new(archive()), PipelineOptions::default());

    let err = pipeline.search_and_score("   ").await.unwrap_err();

    assert!(matches!(err, DietQaError::InvalidInput(_)));
    assert!(model.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_bounded_score_concurrency_keeps_order() {
    let options = PipelineOptions {
        score_concurrency: Some(1),
        ..PipelineOptions::default()
    };
    let pipeline = pipeline_with(ScriptedModel::new(), archive(), options);

    let result = pipeline.search_and_score(QUESTION).await.unwrap();

    let ids: Vec<&str> = result
        .speeches
        .iter()
        .map(|s| s.speech.record.speech_id.as_str())
        .collect();
    assert_eq!(ids, vec!["d", "b", "a"]);
}

#[tokio::test]
async fn test_search_and_score_stream_event_order() {
    let pipeline = pipeline_with(ScriptedModel::new(), archive(), PipelineOptions::default());
    let mut rx = pipeline.search_and_score_stream(QUESTION);

    let mut progress = Vec::new();
    let mut finished = None;
    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::Progress(snapshot) => progress.push(snapshot),
            StreamEvent::Finished(result) => finished = Some(result),
            StreamEvent::Failed(err) => panic!("unexpected failure: {}", err),
        }
    }

    let messages: Vec<&str> = progress.iter().map(|p| p.progress.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Generating search queries...",
            "Searching speeches...",
            "Scoring 3 speeches...",
            "Ranking 3 speeches..."
        ]
    );
    assert!(progress[0].queries.is_none());
    assert_eq!(
        progress[1].queries.as_deref(),
        Some(&["予算 2024".to_string(), "防衛費".to_string()][..])
    );
    assert_eq!(progress[2].speeches_length, Some(3));
    assert!(!progress[2].usage.contains_key(&Stage::Score));
    assert_eq!(progress[3].usage[&Stage::Score].input.tokens, 3 * INPUT_TOKENS);
    assert!(progress[1].usage.contains_key(&Stage::Queries));
    assert_eq!(finished.unwrap().speeches.len(), 3);
}

#[tokio::test]
async fn test_stream_failure_is_terminal_event() {
    let mut model = ScriptedModel::new();
    model.queries_reply = "no json here".to_string();
    let pipeline = pipeline_with(model, archive(), PipelineOptions::default());

    let mut seen = Vec::new();
    let err = drain_stream(pipeline.search_and_score_stream(QUESTION), |p| {
        seen.push(p.progress.clone())
    })
    .await
    .unwrap_err();

    assert_eq!(seen, vec!["Generating search queries..."]);
    assert!(matches!(err, DietQaError::MalformedOutput { .. }));
}

const SPEECH: &str = "○岸田国務大臣　防衛費は増額でございます。\n　財源は検討中です。";

fn annotating_model(marked: &str) -> ScriptedModel {
    let mut model = ScriptedModel::new();
    model.annotated_reply = json_block(&serde_json::json!({ "annotated": marked }).to_string());
    model
}

#[tokio::test]
async fn test_summarize_and_annotate_realigns_markers() {
    let model = Arc::new(annotating_model(
        "○岸田国務大臣　<u>防衛費は増額でござります。</u>\n　財源は検討中です。",
    ));
    let pipeline = Pipeline::new(model.clone(), Arc::new(archive()), PipelineOptions::default());

    let result = pipeline
        .summarize_and_annotate(QUESTION, SPEECH)
        .await
        .unwrap();

    assert_eq!(result.summary, "防衛費は増額です。");
    assert!(result.has_matching_section());
    assert_eq!(
        result.annotated,
        "○岸田国務大臣　<u>防衛費は増額でございます。</u>\n　財源は検討中です。"
    );
    assert_eq!(result.usage[&Stage::Summarize].input.tokens, INPUT_TOKENS);
    assert_eq!(result.usage[&Stage::Annotate].input.tokens, INPUT_TOKENS);
    assert!(result.seconds.contains_key(&Stage::Annotate));
}

#[tokio::test]
async fn test_summary_sees_cleaned_speech_and_annotation_sees_original() {
    let model = Arc::new(annotating_model(SPEECH));
    let pipeline = Pipeline::new(model.clone(), Arc::new(archive()), PipelineOptions::default());

    pipeline
        .summarize_and_annotate(QUESTION, SPEECH)
        .await
        .unwrap();

    let summary_prompts = model.prompts_containing(SUMMARY_PROMPT_MARK);
    assert_eq!(summary_prompts.len(), 1);
    assert!(summary_prompts[0].contains("防衛費は増額でございます。\n財源は検討中です。"));
    assert!(!summary_prompts[0].contains("○岸田"));

    let annotate_prompts = model.prompts_containing(ANNOTATE_PROMPT_MARK);
    assert_eq!(annotate_prompts.len(), 1);
    assert!(annotate_prompts[0].contains(SPEECH));
    assert!(annotate_prompts[0].contains("防衛費は増額です。"));
}

#[tokio::test]
async fn test_no_matching_section_still_annotates() {
    let mut model = annotating_model(SPEECH);
    model.summary_reply = json_block(r#"{"summary": "（該当箇所がありません）"}"#);
    let pipeline = pipeline_with(model, archive(), PipelineOptions::default());

    let result = pipeline
        .summarize_and_annotate(QUESTION, SPEECH)
        .await
        .unwrap();

    assert!(!result.has_matching_section());
    assert_eq!(result.annotated, SPEECH);
}

#[tokio::test]
async fn test_missing_annotated_key_fails_after_two_progress_events() {
    let mut model = ScriptedModel::new();
    model.annotated_reply = json_block(r#"{"marked": "..."}"#);
    let pipeline = pipeline_with(model, archive(), PipelineOptions::default());

    let mut rx = pipeline.summarize_and_annotate_stream(QUESTION, SPEECH);
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), 3);
    match &events[1] {
        StreamEvent::Progress(snapshot) => {
            assert_eq!(snapshot.progress, "Annotating...");
            assert_eq!(snapshot.summary.as_deref(), Some("防衛費は増額です。"));
            assert!(snapshot.usage.contains_key(&Stage::Summarize));
        }
        other => panic!("expected progress, got {:?}", other),
    }
    assert!(matches!(
        events[2],
        StreamEvent::Failed(DietQaError::MalformedOutput {
            stage: Stage::Annotate,
            key: "annotated"
        })
    ));
}

#[tokio::test]
async fn test_summarize_rejects_empty_speech() {
    let pipeline = pipeline_with(ScriptedModel::new(), archive(), PipelineOptions::default());

    let err = pipeline
        .summarize_and_annotate(QUESTION, " \n ")
        .await
        .unwrap_err();

    assert!(matches!(err, DietQaError::InvalidInput(_)));
}

#[tokio::test]
async fn test_model_slot_hands_out_preset_model() {
    let model: Arc<dyn dietqa_core::ChatModel> = Arc::new(ScriptedModel::new());
    let slot = ModelSlot::with_model(ModelConfig::default(), model.clone());

    assert!(slot.is_initialized());
    let first = slot.get().await.unwrap();
    let second = slot.get().await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &model));
}
