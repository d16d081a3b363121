//! HTTP client for the Pathway API, used by the terminal questionnaire.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::advisor::models::{RecommendationSet, RoadmapPlan};
use crate::flow::handlers::NextQuestionResponse;
use crate::profile::models::StudentProfile;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The AI provider is out of quota; the user should come back later.
    #[error("service busy: {0}")]
    ServiceBusy(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// The API calls the questionnaire flow depends on.
#[async_trait]
pub trait FlowBackend: Send + Sync {
    async fn create_profile(&self, body: &Value) -> Result<StudentProfile, ClientError>;
    async fn update_profile(&self, id: &str, patch: &Value) -> Result<StudentProfile, ClientError>;
    async fn next_question(
        &self,
        id: &str,
        answer: Option<&str>,
    ) -> Result<NextQuestionResponse, ClientError>;
    async fn recommend(&self, id: &str) -> Result<RecommendationSet, ClientError>;
    async fn roadmap(&self, id: &str) -> Result<RoadmapPlan, ClientError>;
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        debug!("API responded {status}");

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = error_message(&response.text().await.unwrap_or_default());
        if status == StatusCode::TOO_MANY_REQUESTS {
            Err(ClientError::ServiceBusy(message))
        } else {
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl FlowBackend for ApiClient {
    async fn create_profile(&self, body: &Value) -> Result<StudentProfile, ClientError> {
        self.send(self.client.post(self.url("/api/student/profile")).json(body))
            .await
    }

    async fn update_profile(&self, id: &str, patch: &Value) -> Result<StudentProfile, ClientError> {
        self.send(
            self.client
                .patch(self.url(&format!("/api/student/profile/{id}")))
                .json(patch),
        )
        .await
    }

    async fn next_question(
        &self,
        id: &str,
        answer: Option<&str>,
    ) -> Result<NextQuestionResponse, ClientError> {
        let body = json!({"studentId": id, "answer": answer});
        self.send(self.client.post(self.url("/api/ai/next-question")).json(&body))
            .await
    }

    async fn recommend(&self, id: &str) -> Result<RecommendationSet, ClientError> {
        let body = json!({"studentId": id});
        self.send(self.client.post(self.url("/api/ai/recommend")).json(&body))
            .await
    }

    async fn roadmap(&self, id: &str) -> Result<RoadmapPlan, ClientError> {
        let body = json!({"studentId": id});
        self.send(self.client.post(self.url("/api/ai/roadmap")).json(&body))
            .await
    }
}

/// Extracts `error.message` from an API error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
