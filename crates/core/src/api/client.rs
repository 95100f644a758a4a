//! The backend API abstraction.

use async_trait::async_trait;
use mm_protocol::api_models::{
    ChatHistoryResponse, ChatInput, ChatReply, KeywordCount, Mention, MentionFilters,
    MentionTypeCount, RecentQuestionsResponse, RunScriptRequest, RunScriptResponse,
    SentimentCount,
};
use mm_protocol::process_models::ActiveProcess;

use super::error::ApiResult;

/// Everything the monitor needs from the mentions backend.
///
/// Implementations must be cheap to share behind an `Arc`; the tracker,
/// the session and every poll task hold the same instance.
#[async_trait]
pub trait MonitorApi: Send + Sync {
    /// `GET /company/status?company=...`
    ///
    /// Returns the raw status label. A null status is `ApiError::NotFound`.
    async fn company_status(&self, company: &str) -> ApiResult<String>;

    /// `GET /companies/active-processes`
    async fn active_processes(&self) -> ApiResult<Vec<ActiveProcess>>;

    /// `POST /run-script`
    async fn run_script(&self, request: &RunScriptRequest) -> ApiResult<RunScriptResponse>;

    /// `GET /logs/{filename}`, full current content.
    async fn fetch_log(&self, log_file: &str) -> ApiResult<String>;

    /// `GET /companies`
    async fn companies(&self) -> ApiResult<Vec<String>>;

    /// `GET /mentions`
    async fn mentions(&self, company: &str, filters: &MentionFilters) -> ApiResult<Vec<Mention>>;

    /// `GET /sentiment-breakdown`
    async fn sentiment_breakdown(&self, company: &str) -> ApiResult<Vec<SentimentCount>>;

    /// `GET /mention-types`
    async fn mention_types(&self, company: &str) -> ApiResult<Vec<MentionTypeCount>>;

    /// `GET /keywords-breakdown`
    async fn keywords_breakdown(&self, company: &str) -> ApiResult<Vec<KeywordCount>>;

    /// `POST /chat`
    async fn send_chat(&self, input: &ChatInput) -> ApiResult<ChatReply>;

    /// `GET /chat/history`
    async fn chat_history(&self, company: &str, session_id: &str)
        -> ApiResult<ChatHistoryResponse>;

    /// `GET /chat/recent-questions`
    async fn recent_questions(
        &self,
        company: &str,
        limit: u32,
    ) -> ApiResult<RecentQuestionsResponse>;
}
