//! Question-answering sessions against a company's collected mentions.

use chrono::Utc;
use mm_protocol::api_models::{ChatInput, ChatMessage, ChatRole};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::{ApiError, ApiResult, MonitorApi};

/// Questions offered to users who have not asked anything yet.
pub const SUGGESTED_QUESTIONS: [&str; 4] = [
    "What do users think about the salary?",
    "Are working hours flexible?",
    "How is the company culture?",
    "What are the main complaints?",
];

/// How many earlier questions are offered by default.
pub const RECENT_QUESTION_LIMIT: u32 = 10;

/// Questions recently asked about `company`, newest first, without blanks
/// or repeats.
pub async fn recent_questions(api: &dyn MonitorApi, company: &str, limit: u32) -> ApiResult<Vec<String>> {
    let response = api.recent_questions(company, limit).await?;

    let mut questions: Vec<String> = Vec::with_capacity(response.questions.len());
    for question in response.questions {
        let question = question.trim();
        if !question.is_empty() && !questions.iter().any(|q| q == question) {
            questions.push(question.to_string());
        }
    }
    Ok(questions)
}

/// A conversation with the backend about one company.
#[derive(Debug, Clone)]
pub struct ChatSession {
    company: String,
    session_id: String,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Start a new conversation with a fresh session id.
    pub fn new(company: impl Into<String>) -> Self {
        Self::resume(company, Uuid::new_v4().to_string())
    }

    /// Continue a conversation the backend already knows.
    pub fn resume(company: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            session_id: session_id.into(),
            messages: Vec::new(),
        }
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    fn push(&mut self, role: ChatRole, content: String) {
        self.messages.push(ChatMessage {
            role,
            content,
            timestamp: Utc::now(),
        });
    }

    /// Ask a question and record both sides of the exchange.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` for an empty question, or the
    /// backend error. On a backend error the question stays in the
    /// transcript without an answer.
    pub async fn send(&mut self, api: &dyn MonitorApi, query: &str) -> ApiResult<String> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::InvalidRequest("Question must not be empty".to_string()));
        }

        self.push(ChatRole::User, query.to_string());
        let input = ChatInput {
            company: self.company.clone(),
            query: query.to_string(),
            session_id: self.session_id.clone(),
        };

        match api.send_chat(&input).await {
            Ok(reply) => {
                debug!(company = %self.company, session_id = %self.session_id, "chat answered");
                self.push(ChatRole::Assistant, reply.answer.clone());
                Ok(reply.answer)
            }
            Err(e) => {
                warn!(company = %self.company, error = %e, "chat request failed");
                Err(e)
            }
        }
    }

    /// Replace the transcript with the backend's history of this session.
    pub async fn load_history(&mut self, api: &dyn MonitorApi) -> ApiResult<usize> {
        let response = api.chat_history(&self.company, &self.session_id).await?;

        self.messages.clear();
        for item in response.history {
            let role = if item.role == "human" {
                ChatRole::User
            } else {
                ChatRole::Assistant
            };
            self.push(role, item.message);
        }
        Ok(self.messages.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockMonitorApi;
    use mm_protocol::api_models::ChatHistoryItem;

    #[tokio::test]
    async fn test_send_records_exchange() {
        let api = MockMonitorApi::new();
        api.set_chat_answer(Ok("Mostly positive."));
        let mut chat = ChatSession::new("Acme");

        let answer = chat.send(&api, " How is the culture? ").await.expect("answer");

        assert_eq!(answer, "Mostly positive.");
        let roles: Vec<ChatRole> = chat.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant]);
        assert_eq!(chat.messages()[0].content, "How is the culture?");

        let inputs = api.chat_inputs();
        assert_eq!(inputs[0].session_id, chat.session_id());
        assert_eq!(inputs[0].company, "Acme");
    }

    #[tokio::test]
    async fn test_failed_send_keeps_question() {
        let api = MockMonitorApi::new();
        api.set_chat_answer(Err(ApiError::Network("down".to_string())));
        let mut chat = ChatSession::new("Acme");

        assert!(chat.send(&api, "Anything?").await.is_err());
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].role, ChatRole::User);
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected() {
        let api = MockMonitorApi::new();
        let mut chat = ChatSession::new("Acme");

        assert!(matches!(
            chat.send(&api, "   ").await,
            Err(ApiError::InvalidRequest(_))
        ));
        assert!(chat.messages().is_empty());
        assert!(api.chat_inputs().is_empty());
    }

    #[tokio::test]
    async fn test_load_history_maps_roles() {
        let api = MockMonitorApi::new();
        api.set_chat_history(
            "s-1",
            vec![
                ChatHistoryItem {
                    role: "human".to_string(),
                    message: "Salary?".to_string(),
                },
                ChatHistoryItem {
                    role: "ai".to_string(),
                    message: "Competitive.".to_string(),
                },
            ],
        );
        let mut chat = ChatSession::resume("Acme", "s-1");

        assert_eq!(chat.load_history(&api).await, Ok(2));
        assert_eq!(chat.messages()[0].role, ChatRole::User);
        assert_eq!(chat.messages()[1].role, ChatRole::Assistant);
        assert_eq!(chat.messages()[1].content, "Competitive.");
    }

    #[tokio::test]
    async fn test_recent_questions_skip_repeats() {
        let api = MockMonitorApi::new();
        let mut chat = ChatSession::new("Acme");
        for query in ["Salary?", "Culture?", "Salary?"] {
            chat.send(&api, query).await.expect("answer");
        }

        let questions = recent_questions(&api, "Acme", RECENT_QUESTION_LIMIT)
            .await
            .expect("questions");

        assert_eq!(questions, vec!["Salary?".to_string(), "Culture?".to_string()]);
    }

    #[test]
    fn test_new_sessions_get_distinct_ids() {
        assert_ne!(ChatSession::new("Acme").session_id(), ChatSession::new("Acme").session_id());
    }
}
