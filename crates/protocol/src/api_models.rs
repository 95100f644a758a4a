//! Backend HTTP API models.
//!
//! Request and response bodies for the mentions backend. Field names follow
//! the backend's JSON exactly, which is why a few of them are not camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

/// Body of `GET /company/status`.
///
/// `status` is null when the backend has never heard of the company.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of `POST /run-script`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct RunScriptRequest {
    pub company: String,

    /// Maximum number of mentions to scrape.
    pub limit: u32,

    /// Run every pipeline step rather than scraping only.
    pub all_steps: bool,
}

impl RunScriptRequest {
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            limit: 100,
            all_steps: true,
        }
    }
}

/// Response of `POST /run-script`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct RunScriptResponse {
    #[serde(default)]
    pub pid: Option<u32>,

    /// Log file the new job writes to.
    #[serde(default)]
    pub log_file: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

/// A single collected mention of a company.
///
/// The backend's mentions table has no source column and stores keywords
/// as a nullable JSON list, so both are optional on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct Mention {
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "type")]
    pub mention_type: String,
    pub sentiment: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub keywords: Vec<String>,
    pub text: String,
    #[serde(default)]
    pub translated: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Query filters for `GET /mentions`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct MentionFilters {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mention_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    pub limit: u32,
}

impl Default for MentionFilters {
    fn default() -> Self {
        Self {
            mention_type: None,
            sentiment: None,
            keyword: None,
            limit: 50,
        }
    }
}

/// Row of `GET /sentiment-breakdown`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct SentimentCount {
    pub sentiment: String,
    pub count: u64,
}

/// Row of `GET /mention-types`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct MentionTypeCount {
    #[serde(rename = "type")]
    pub mention_type: String,
    pub count: u64,
}

/// Row of `GET /keywords-breakdown`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u64,
}

/// Body of `POST /chat`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ChatInput {
    pub company: String,
    pub query: String,
    pub session_id: String,
}

/// Response of `POST /chat`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ChatReply {
    pub answer: String,
}

/// Author of a chat message.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A chat message as kept by the client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// One entry of `GET /chat/history`. The backend uses `human` for user turns.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ChatHistoryItem {
    pub role: String,
    pub message: String,
}

/// Body of `GET /chat/history`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ChatHistoryResponse {
    #[serde(default)]
    pub history: Vec<ChatHistoryItem>,
}

/// Body of `GET /chat/recent-questions`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct RecentQuestionsResponse {
    #[serde(default)]
    pub questions: Vec<String>,
}

/// Aggregated numbers across every monitored company.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_companies: usize,
    pub total_mentions: usize,

    /// Weighted sentiment score, formatted like `6.5/10`.
    pub avg_sentiment_score: String,

    pub active_companies: usize,
}
