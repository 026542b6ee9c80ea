//! Speech records as returned by the archive

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// One speech from the archive
///
/// Field names on the wire follow the archive's JSON (`speechID`, `nameOfHouse`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRecord {
    #[serde(rename = "speechID")]
    pub speech_id: String,
    /// Proceeding (meeting record) id
    #[serde(rename = "issueID", default)]
    pub issue_id: String,
    #[serde(default)]
    pub image_kind: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub search_object: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub session: u32,
    #[serde(default)]
    pub name_of_house: String,
    #[serde(default)]
    pub name_of_meeting: String,
    #[serde(default)]
    pub issue: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub closing: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub speech_order: u32,
    #[serde(default)]
    pub speaker: String,
    #[serde(default)]
    pub speaker_yomi: Option<String>,
    /// Parliamentary group
    #[serde(default)]
    pub speaker_group: Option<String>,
    /// Title, e.g. 国務大臣
    #[serde(default)]
    pub speaker_position: Option<String>,
    /// Procedural role, e.g. 議長 or 証人
    #[serde(default)]
    pub speaker_role: Option<String>,
    pub speech: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub start_page: u32,
    #[serde(rename = "speechURL", default)]
    pub speech_url: String,
    #[serde(rename = "meetingURL", default)]
    pub meeting_url: String,
    #[serde(rename = "pdfURL", default)]
    pub pdf_url: Option<String>,
}

impl SpeechRecord {
    /// Titled speakers without a procedural role; drops chair remarks and the like
    pub fn is_substantive(&self) -> bool {
        let has_title = self
            .speaker_position
            .as_deref()
            .is_some_and(|p| !p.is_empty());
        let has_role = self.speaker_role.as_deref().is_some_and(|r| !r.is_empty());
        has_title && !has_role
    }

    /// Length of the speech text in characters
    pub fn speech_length(&self) -> usize {
        self.speech.chars().count()
    }
}

/// A record plus the distinct queries that found it, first-seen order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    #[serde(flatten)]
    pub record: SpeechRecord,
    pub queries: Vec<String>,
}

impl QueryMatch {
    pub fn new(record: SpeechRecord) -> Self {
        Self {
            record,
            queries: Vec::new(),
        }
    }

    /// Record `query` unless it is already listed
    pub fn add_query(&mut self, query: &str) {
        if !self.queries.iter().any(|q| q == query) {
            self.queries.push(query.to_string());
        }
    }
}

/// Body of one archive search response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveResponse {
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    pub number_of_records: Option<u64>,
    #[serde(default)]
    pub speech_record: Vec<SpeechRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

impl NumberOrString {
    fn into_u64(self) -> Option<u64> {
        match self {
            NumberOrString::Number(n) => Some(n),
            NumberOrString::String(s) => s.trim().parse().ok(),
        }
    }
}

/// The archive sends some numbers as strings
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Option::<NumberOrString>::deserialize(deserializer)?;
    Ok(value
        .and_then(NumberOrString::into_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or_default())
}

fn lenient_opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<NumberOrString>::deserialize(deserializer)?;
    Ok(value.and_then(NumberOrString::into_u64))
}
