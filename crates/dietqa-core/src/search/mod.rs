//! Speech archive search
//!
//! One GET per query, then a merge that filters procedural remarks,
//! de-duplicates by speech id and orders newest first.

mod kokkai;
mod record;

pub use kokkai::KokkaiClient;
pub use record::{ArchiveResponse, QueryMatch, SpeechRecord};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Source of speech records, one request per query
#[async_trait]
pub trait SpeechArchive: Send + Sync {
    async fn fetch(&self, query: &str, max_records: usize) -> Result<ArchiveResponse>;
}

/// Search options
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// `maximumRecords` per query
    pub max_records: usize,
    /// Issue every query at once instead of one at a time
    pub concurrent: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_records: 30,
            concurrent: false,
        }
    }
}

/// Merged search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub speeches: Vec<QueryMatch>,
    /// Wall-clock time for the whole fan-out
    pub seconds: f64,
}

/// Run every query against the archive and merge the responses
pub async fn search_speeches(
    archive: &dyn SpeechArchive,
    queries: &[String],
    options: &SearchOptions,
) -> Result<SearchOutcome> {
    let start = Instant::now();

    let responses = if options.concurrent {
        let fetches = queries
            .iter()
            .map(|query| archive.fetch(query, options.max_records));
        futures::future::try_join_all(fetches).await?
    } else {
        let mut responses = Vec::with_capacity(queries.len());
        for query in queries {
            responses.push(archive.fetch(query, options.max_records).await?);
        }
        responses
    };

    for (query, response) in queries.iter().zip(&responses) {
        tracing::debug!(
            "Query {:?}: {} records",
            query,
            response.speech_record.len()
        );
    }

    let speeches = merge_responses(queries.iter().map(String::as_str).zip(responses));
    let seconds = start.elapsed().as_secs_f64();

    tracing::info!(
        "Archive search: {} queries, {} speeches in {:.2}s",
        queries.len(),
        speeches.len(),
        seconds
    );

    Ok(SearchOutcome { speeches, seconds })
}

/// Merge per-query responses, given in query order
///
/// Only substantive speeches are kept; a speech found by several queries
/// appears once and lists them in the order they were seen. The result is
/// sorted by date, newest first, with ties in first-seen order.
pub fn merge_responses<'a>(
    responses: impl IntoIterator<Item = (&'a str, ArchiveResponse)>,
) -> Vec<QueryMatch> {
    let mut speeches: Vec<QueryMatch> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (query, response) in responses {
        for record in response.speech_record {
            if !record.is_substantive() {
                continue;
            }
            let pos = *index.entry(record.speech_id.clone()).or_insert_with(|| {
                speeches.push(QueryMatch::new(record));
                speeches.len() - 1
            });
            speeches[pos].add_query(query);
        }
    }

    speeches.sort_by(|a, b| b.record.date.cmp(&a.record.date));
    speeches
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn record(id: &str, date: &str) -> SpeechRecord {
        SpeechRecord {
            speech_id: id.to_string(),
            issue_id: format!("{}-issue", id),
            image_kind: "会議録".to_string(),
            search_object: 1,
            session: 213,
            name_of_house: "衆議院".to_string(),
            name_of_meeting: "予算委員会".to_string(),
            issue: "第1号".to_string(),
            date: date.parse::<NaiveDate>().unwrap(),
            closing: None,
            speech_order: 1,
            speaker: "某".to_string(),
            speaker_yomi: None,
            speaker_group: None,
            speaker_position: Some("国務大臣".to_string()),
            speaker_role: None,
            speech: format!("{}の発言", id),
            start_page: 1,
            speech_url: String::new(),
            meeting_url: String::new(),
            pdf_url: None,
        }
    }

    fn response(records: Vec<SpeechRecord>) -> ArchiveResponse {
        ArchiveResponse {
            number_of_records: Some(records.len() as u64),
            speech_record: records,
        }
    }

    struct FakeArchive {
        responses: HashMap<String, Vec<SpeechRecord>>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SpeechArchive for FakeArchive {
        async fn fetch(&self, query: &str, _max_records: usize) -> Result<ArchiveResponse> {
            self.calls.lock().unwrap().push(query.to_string());
            Ok(response(self.responses.get(query).cloned().unwrap_or_default()))
        }
    }

    #[test]
    fn test_merge_dedups_and_accumulates_queries() {
        let merged = merge_responses(vec![
            ("A", response(vec![record("s1", "2024-01-01"), record("s2", "2024-02-01")])),
            ("B", response(vec![record("s2", "2024-02-01"), record("s3", "2023-05-01")])),
        ]);

        let ids: Vec<&str> = merged.iter().map(|m| m.record.speech_id.as_str()).collect();
        assert_eq!(ids, vec!["s2", "s1", "s3"]);
        assert_eq!(merged[0].queries, vec!["A", "B"]);
        assert_eq!(merged[1].queries, vec!["A"]);
        assert_eq!(merged[2].queries, vec!["B"]);
    }

    #[test]
    fn test_merge_filters_procedural_speakers() {
        let mut chair = record("chair", "2024-01-01");
        chair.speaker_role = Some("委員長".to_string());
        let mut untitled = record("untitled", "2024-01-01");
        untitled.speaker_position = None;

        let merged = merge_responses(vec![(
            "A",
            response(vec![chair, untitled, record("ok", "2024-01-01")]),
        )]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].record.speech_id, "ok");
    }

    #[test]
    fn test_merge_same_date_keeps_first_seen_order() {
        let merged = merge_responses(vec![
            ("A", response(vec![record("x", "2024-01-01")])),
            ("B", response(vec![record("y", "2024-01-01"), record("z", "2024-01-01")])),
        ]);
        let ids: Vec<&str> = merged.iter().map(|m| m.record.speech_id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[tokio::test]
    async fn test_search_speeches_sequential_in_query_order() {
        let mut responses = HashMap::new();
        responses.insert("A".to_string(), vec![record("s1", "2024-01-01")]);
        responses.insert("B".to_string(), vec![record("s1", "2024-01-01")]);
        let archive = FakeArchive {
            responses,
            calls: Mutex::new(Vec::new()),
        };

        let queries = vec!["A".to_string(), "B".to_string()];
        let outcome = search_speeches(&archive, &queries, &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(*archive.calls.lock().unwrap(), vec!["A", "B"]);
        assert_eq!(outcome.speeches.len(), 1);
        assert_eq!(outcome.speeches[0].queries, vec!["A", "B"]);
        assert!(outcome.seconds >= 0.0);
    }

    #[tokio::test]
    async fn test_search_speeches_concurrent_keeps_attribution_order() {
        let mut responses = HashMap::new();
        responses.insert("A".to_string(), vec![record("s1", "2024-01-01")]);
        responses.insert("B".to_string(), vec![record("s1", "2024-01-01")]);
        let archive = FakeArchive {
            responses,
            calls: Mutex::new(Vec::new()),
        };

        let queries = vec!["B".to_string(), "A".to_string()];
        let options = SearchOptions {
            concurrent: true,
            ..SearchOptions::default()
        };
        let outcome = search_speeches(&archive, &queries, &options).await.unwrap();
        assert_eq!(outcome.speeches[0].queries, vec!["B", "A"]);
    }
}
