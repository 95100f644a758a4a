//! Mock backend implementation for testing.
//!
//! Replies are scripted per company (status) or per log file (logs). Each
//! call consumes the next scripted reply; the last one repeats forever.

use async_trait::async_trait;
use mm_protocol::api_models::{
    ChatHistoryItem, ChatHistoryResponse, ChatInput, ChatReply, KeywordCount, Mention,
    MentionFilters, MentionTypeCount, RecentQuestionsResponse, RunScriptRequest,
    RunScriptResponse, SentimentCount,
};
use mm_protocol::process_models::ActiveProcess;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use super::client::MonitorApi;
use super::error::{ApiError, ApiResult};

type Script<T> = VecDeque<ApiResult<T>>;

#[derive(Default)]
struct MockState {
    statuses: HashMap<String, Script<String>>,
    logs: HashMap<String, Script<String>>,
    active: Option<ApiResult<Vec<ActiveProcess>>>,
    run_response: Option<ApiResult<RunScriptResponse>>,
    companies: Vec<String>,
    mentions: HashMap<String, ApiResult<Vec<Mention>>>,
    sentiment: HashMap<String, Vec<SentimentCount>>,
    mention_types: HashMap<String, Vec<MentionTypeCount>>,
    keywords: HashMap<String, Vec<KeywordCount>>,
    status_latency: HashMap<String, Duration>,
    chat_answer: Option<ApiResult<String>>,
    chat_history: HashMap<String, Vec<ChatHistoryItem>>,
    status_calls: HashMap<String, usize>,
    log_calls: HashMap<String, usize>,
    run_requests: Vec<RunScriptRequest>,
    chat_inputs: Vec<ChatInput>,
}

/// Scripted in-memory backend.
#[derive(Default)]
pub struct MockMonitorApi {
    state: Mutex<MockState>,
    latency: Option<Duration>,
}

fn next_reply<T: Clone>(script: Option<&mut Script<T>>, missing: impl FnOnce() -> ApiError) -> ApiResult<T> {
    match script {
        Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(|| Err(missing())),
        Some(queue) => queue.front().cloned().unwrap_or_else(|| Err(missing())),
        None => Err(missing()),
    }
}

impl MockMonitorApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency` (use with a paused tokio clock).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the original failure.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    /// Delay status lookups of `company` by `latency` on top of the global latency.
    pub fn set_status_latency(&self, company: &str, latency: Duration) {
        self.lock().status_latency.insert(company.to_string(), latency);
    }

    /// Replace the status script of `company` with a single sticky label.
    pub fn set_status(&self, company: &str, label: &str) {
        self.lock()
            .statuses
            .insert(company.to_string(), VecDeque::from([Ok(label.to_string())]));
    }

    /// Append a reply to the status script of `company`.
    pub fn push_status(&self, company: &str, reply: ApiResult<&str>) {
        self.lock()
            .statuses
            .entry(company.to_string())
            .or_default()
            .push_back(reply.map(str::to_string));
    }

    /// Make every status lookup for `company` fail with `error`.
    pub fn fail_status(&self, company: &str, error: ApiError) {
        self.lock()
            .statuses
            .insert(company.to_string(), VecDeque::from([Err(error)]));
    }

    pub fn set_active(&self, processes: Vec<ActiveProcess>) {
        self.lock().active = Some(Ok(processes));
    }

    pub fn fail_active(&self, error: ApiError) {
        self.lock().active = Some(Err(error));
    }

    pub fn set_log(&self, log_file: &str, content: &str) {
        self.lock()
            .logs
            .insert(log_file.to_string(), VecDeque::from([Ok(content.to_string())]));
    }

    pub fn push_log(&self, log_file: &str, reply: ApiResult<&str>) {
        self.lock()
            .logs
            .entry(log_file.to_string())
            .or_default()
            .push_back(reply.map(str::to_string));
    }

    pub fn set_run_response(&self, response: ApiResult<RunScriptResponse>) {
        self.lock().run_response = Some(response);
    }

    pub fn set_companies(&self, companies: Vec<String>) {
        self.lock().companies = companies;
    }

    pub fn set_mentions(&self, company: &str, mentions: ApiResult<Vec<Mention>>) {
        self.lock().mentions.insert(company.to_string(), mentions);
    }

    pub fn set_sentiment(&self, company: &str, counts: Vec<SentimentCount>) {
        self.lock().sentiment.insert(company.to_string(), counts);
    }

    pub fn set_mention_types(&self, company: &str, counts: Vec<MentionTypeCount>) {
        self.lock().mention_types.insert(company.to_string(), counts);
    }

    pub fn set_keywords(&self, company: &str, counts: Vec<KeywordCount>) {
        self.lock().keywords.insert(company.to_string(), counts);
    }

    pub fn set_chat_answer(&self, answer: ApiResult<&str>) {
        self.lock().chat_answer = Some(answer.map(str::to_string));
    }

    pub fn set_chat_history(&self, session_id: &str, history: Vec<ChatHistoryItem>) {
        self.lock()
            .chat_history
            .insert(session_id.to_string(), history);
    }

    pub fn status_calls(&self, company: &str) -> usize {
        self.lock().status_calls.get(company).copied().unwrap_or(0)
    }

    pub fn log_calls(&self, log_file: &str) -> usize {
        self.lock().log_calls.get(log_file).copied().unwrap_or(0)
    }

    pub fn run_requests(&self) -> Vec<RunScriptRequest> {
        self.lock().run_requests.clone()
    }

    pub fn chat_inputs(&self) -> Vec<ChatInput> {
        self.lock().chat_inputs.clone()
    }
}

#[async_trait]
impl MonitorApi for MockMonitorApi {
    async fn company_status(&self, company: &str) -> ApiResult<String> {
        self.simulate_latency().await;
        let extra = self.lock().status_latency.get(company).copied();
        if let Some(extra) = extra {
            tokio::time::sleep(extra).await;
        }
        let mut state = self.lock();
        *state.status_calls.entry(company.to_string()).or_default() += 1;
        next_reply(state.statuses.get_mut(company), || {
            ApiError::NotFound(format!("/company/status ({})", company))
        })
    }

    async fn active_processes(&self) -> ApiResult<Vec<ActiveProcess>> {
        self.simulate_latency().await;
        self.lock().active.clone().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn run_script(&self, request: &RunScriptRequest) -> ApiResult<RunScriptResponse> {
        self.simulate_latency().await;
        let mut state = self.lock();
        state.run_requests.push(request.clone());
        state.run_response.clone().unwrap_or_else(|| {
            Ok(RunScriptResponse {
                pid: Some(4242),
                log_file: Some(format!("logs/{}.log", request.company)),
                message: None,
            })
        })
    }

    async fn fetch_log(&self, log_file: &str) -> ApiResult<String> {
        self.simulate_latency().await;
        let mut state = self.lock();
        *state.log_calls.entry(log_file.to_string()).or_default() += 1;
        next_reply(state.logs.get_mut(log_file), || {
            ApiError::NotFound(format!("/logs/{}", log_file))
        })
    }

    async fn companies(&self) -> ApiResult<Vec<String>> {
        self.simulate_latency().await;
        Ok(self.lock().companies.clone())
    }

    async fn mentions(&self, company: &str, filters: &MentionFilters) -> ApiResult<Vec<Mention>> {
        self.simulate_latency().await;
        let mentions = self
            .lock()
            .mentions
            .get(company)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))?;
        Ok(mentions
            .into_iter()
            .take(filters.limit as usize)
            .collect())
    }

    async fn sentiment_breakdown(&self, company: &str) -> ApiResult<Vec<SentimentCount>> {
        self.simulate_latency().await;
        Ok(self.lock().sentiment.get(company).cloned().unwrap_or_default())
    }

    async fn mention_types(&self, company: &str) -> ApiResult<Vec<MentionTypeCount>> {
        self.simulate_latency().await;
        Ok(self.lock().mention_types.get(company).cloned().unwrap_or_default())
    }

    async fn keywords_breakdown(&self, company: &str) -> ApiResult<Vec<KeywordCount>> {
        self.simulate_latency().await;
        Ok(self.lock().keywords.get(company).cloned().unwrap_or_default())
    }

    async fn send_chat(&self, input: &ChatInput) -> ApiResult<ChatReply> {
        self.simulate_latency().await;
        let mut state = self.lock();
        state.chat_inputs.push(input.clone());
        let answer = state
            .chat_answer
            .clone()
            .unwrap_or_else(|| Ok(format!("Mock answer to: {}", input.query)))?;
        Ok(ChatReply { answer })
    }

    async fn chat_history(
        &self,
        _company: &str,
        session_id: &str,
    ) -> ApiResult<ChatHistoryResponse> {
        self.simulate_latency().await;
        Ok(ChatHistoryResponse {
            history: self
                .lock()
                .chat_history
                .get(session_id)
                .cloned()
                .unwrap_or_default(),
        })
    }

    async fn recent_questions(
        &self,
        _company: &str,
        limit: u32,
    ) -> ApiResult<RecentQuestionsResponse> {
        self.simulate_latency().await;
        let questions = self
            .lock()
            .chat_inputs
            .iter()
            .rev()
            .take(limit as usize)
            .map(|input| input.query.clone())
            .collect();
        Ok(RecentQuestionsResponse { questions })
    }
}
