//! reqwest-based backend client.

use async_trait::async_trait;
use mm_protocol::api_models::{
    ChatHistoryResponse, ChatInput, ChatReply, KeywordCount, Mention, MentionFilters,
    MentionTypeCount, RecentQuestionsResponse, RunScriptRequest, RunScriptResponse,
    SentimentCount, StatusResponse,
};
use mm_protocol::process_models::ActiveProcess;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::client::MonitorApi;
use super::error::{ApiError, ApiResult};
use crate::config::models::AppConfig;

/// HTTP client for the mentions backend.
#[derive(Debug, Clone)]
pub struct HttpMonitorApi {
    client: Client,
    base_url: String,
}

impl HttpMonitorApi {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> ApiResult<Self> {
        Self::new(config.settings.api_base_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, endpoint: &str) -> ApiResult<Response> {
        debug!(endpoint, "backend request");
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("{}: {}", endpoint, e)))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(endpoint.to_string())),
            status => Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder, endpoint: &str) -> ApiResult<T> {
        let response = self.send(request, endpoint).await?;
        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                ApiError::Decode {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                }
            } else {
                ApiError::Network(format!("{}: {}", endpoint, e))
            }
        })
    }
}

/// Strips any directory prefix from a backend log reference.
pub fn log_file_name(log_file: &str) -> Option<&str> {
    log_file
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
}

#[async_trait]
impl MonitorApi for HttpMonitorApi {
    async fn company_status(&self, company: &str) -> ApiResult<String> {
        let endpoint = "/company/status";
        let request = self
            .client
            .get(self.url(endpoint))
            .query(&[("company", company)]);
        let body: StatusResponse = self.json(request, endpoint).await?;

        body.status
            .ok_or_else(|| ApiError::NotFound(format!("{} ({})", endpoint, company)))
    }

    async fn active_processes(&self) -> ApiResult<Vec<ActiveProcess>> {
        let endpoint = "/companies/active-processes";
        self.json(self.client.get(self.url(endpoint)), endpoint).await
    }

    async fn run_script(&self, request: &RunScriptRequest) -> ApiResult<RunScriptResponse> {
        let endpoint = "/run-script";
        let builder = self.client.post(self.url(endpoint)).json(request);
        self.json(builder, endpoint).await
    }

    async fn fetch_log(&self, log_file: &str) -> ApiResult<String> {
        let filename = log_file_name(log_file)
            .ok_or_else(|| ApiError::InvalidRequest("No log file specified".to_string()))?;
        let endpoint = format!("/logs/{}", filename);

        let response = self
            .send(self.client.get(self.url(&endpoint)), &endpoint)
            .await?;
        let content = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("{}: {}", endpoint, e)))?;

        debug!(log_file, length = content.len(), "fetched log");
        Ok(content)
    }

    async fn companies(&self) -> ApiResult<Vec<String>> {
        let endpoint = "/companies";
        self.json(self.client.get(self.url(endpoint)), endpoint).await
    }

    async fn mentions(&self, company: &str, filters: &MentionFilters) -> ApiResult<Vec<Mention>> {
        let endpoint = "/mentions";
        let request = self
            .client
            .get(self.url(endpoint))
            .query(&[("company", company)])
            .query(filters);
        self.json(request, endpoint).await
    }

    async fn sentiment_breakdown(&self, company: &str) -> ApiResult<Vec<SentimentCount>> {
        let endpoint = "/sentiment-breakdown";
        let request = self
            .client
            .get(self.url(endpoint))
            .query(&[("company", company)]);
        self.json(request, endpoint).await
    }

    async fn mention_types(&self, company: &str) -> ApiResult<Vec<MentionTypeCount>> {
        let endpoint = "/mention-types";
        let request = self
            .client
            .get(self.url(endpoint))
            .query(&[("company", company)]);
        self.json(request, endpoint).await
    }

    async fn keywords_breakdown(&self, company: &str) -> ApiResult<Vec<KeywordCount>> {
        let endpoint = "/keywords-breakdown";
        let request = self
            .client
            .get(self.url(endpoint))
            .query(&[("company", company)]);
        self.json(request, endpoint).await
    }

    async fn send_chat(&self, input: &ChatInput) -> ApiResult<ChatReply> {
        let endpoint = "/chat";
        let request = self.client.post(self.url(endpoint)).json(input);
        self.json(request, endpoint).await
    }

    async fn chat_history(
        &self,
        company: &str,
        session_id: &str,
    ) -> ApiResult<ChatHistoryResponse> {
        let endpoint = "/chat/history";
        let request = self
            .client
            .get(self.url(endpoint))
            .query(&[("company", company), ("session_id", session_id)]);
        self.json(request, endpoint).await
    }

    async fn recent_questions(
        &self,
        company: &str,
        limit: u32,
    ) -> ApiResult<RecentQuestionsResponse> {
        let endpoint = "/chat/recent-questions";
        let request = self
            .client
            .get(self.url(endpoint))
            .query(&[("company", company.to_string()), ("limit", limit.to_string())]);
        self.json(request, endpoint).await
    }
}
