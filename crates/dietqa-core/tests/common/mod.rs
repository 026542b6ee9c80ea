//! Scripted chat model and in-memory archive shared by the pipeline tests

#![allow(dead_code)]

use async_trait::async_trait;
use dietqa_core::llm::{Price, PriceUnit, UnitPrice};
use dietqa_core::search::ArchiveResponse;
use dietqa_core::{ChatModel, ChatResponse, ModelInfo, Result, SpeechArchive, SpeechRecord};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Mutex;

pub const INPUT_TOKENS: u64 = 10;
pub const OUTPUT_TOKENS: u64 = 2;

/// Answers each prompt kind with a canned JSON block
///
/// Relevance scores are read from a `点数=NN` tag inside the scored text.
pub struct ScriptedModel {
    info: ModelInfo,
    pub queries_reply: String,
    pub summary_reply: String,
    pub annotated_reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            info: ModelInfo::new("scripted on test", None),
            queries_reply: json_block(r#"{"queries": ["予算 2024", "防衛費"]}"#),
            summary_reply: json_block(r#"{"summary": "防衛費は増額です。"}"#),
            annotated_reply: json_block(r#"{"annotated": ""}"#),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_price(mut self, input: f64, output: f64) -> Self {
        self.info.price = Some(Price {
            unit: PriceUnit::Tokens,
            unit_usd: UnitPrice { input, output },
        });
        self
    }

    pub fn prompts_containing(&self, needle: &str) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.contains(needle))
            .cloned()
            .collect()
    }
}

pub fn json_block(body: &str) -> String {
    format!("```json\n{}\n```", body)
}

pub const QUERY_PROMPT_MARK: &str = "検索キーワードを提案";
pub const SCORE_PROMPT_MARK: &str = "101段階";
pub const SUMMARY_PROMPT_MARK: &str = "1段落にまとめて";
pub const ANNOTATE_PROMPT_MARK: &str = "タグで囲って";

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn send_message(&self, prompt: &str) -> Result<ChatResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let text = if prompt.contains(QUERY_PROMPT_MARK) {
            self.queries_reply.clone()
        } else if prompt.contains(SCORE_PROMPT_MARK) {
            let re = Regex::new(r"点数=(\d+)").unwrap();
            match re.captures(prompt) {
                Some(caps) => json_block(&format!(r#"{{"score": "{}"}}"#, &caps[1])),
                None => "I cannot score this.".to_string(),
            }
        } else if prompt.contains(SUMMARY_PROMPT_MARK) {
            self.summary_reply.clone()
        } else if prompt.contains(ANNOTATE_PROMPT_MARK) {
            self.annotated_reply.clone()
        } else {
            String::new()
        };

        Ok(ChatResponse::from_completion(
            prompt,
            text,
            INPUT_TOKENS,
            OUTPUT_TOKENS,
        ))
    }

    fn info(&self) -> &ModelInfo {
        &self.info
    }
}

/// Archive answering from a fixed query → records table
pub struct MemoryArchive {
    pub records: HashMap<String, Vec<SpeechRecord>>,
    pub calls: Mutex<Vec<(String, usize)>>,
}

impl MemoryArchive {
    pub fn new(entries: Vec<(&str, Vec<SpeechRecord>)>) -> Self {
        Self {
            records: entries
                .into_iter()
                .map(|(q, r)| (q.to_string(), r))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SpeechArchive for MemoryArchive {
    async fn fetch(&self, query: &str, max_records: usize) -> Result<ArchiveResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), max_records));
        let speech_record = self.records.get(query).cloned().unwrap_or_default();
        Ok(ArchiveResponse {
            number_of_records: Some(speech_record.len() as u64),
            speech_record,
        })
    }
}

pub fn speech(id: &str, date: &str, text: &str) -> SpeechRecord {
    serde_json::from_value(serde_json::json!({
        "speechID": id,
        "issueID": format!("{}-issue", id),
        "session": 213,
        "nameOfHouse": "衆議院",
        "nameOfMeeting": "予算委員会",
        "issue": "第1号",
        "date": date,
        "speaker": "某",
        "speakerPosition": "国務大臣",
        "speakerRole": null,
        "speech": text,
        "speechURL": format!("https://kokkai.ndl.go.jp/txt/{}", id),
    }))
    .unwrap()
}

pub fn chair_speech(id: &str, date: &str, text: &str) -> SpeechRecord {
    let mut record = speech(id, date, text);
    record.speaker_role = Some("委員長".to_string());
    record
}
