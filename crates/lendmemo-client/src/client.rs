//! Memo client implementation for the lendmemo REST API.

use lendmemo_core::error::{LendError, LendResult};
use lendmemo_core::types::{
    CreateMemoRequest, CreateMemoResponse, MemoDetail, MemoStatus, MessageResponse,
    UpdateMemoRequest,
};

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Default server address used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Client for the lendmemo REST API.
#[derive(Debug, Clone)]
pub struct MemoClient {
    client: Client,
    base_url: String,
}

/// Health probe response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl MemoClient {
    /// Create a client talking to `base_url` (e.g. `http://localhost:8080`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Create a client from `LENDMEMO_BASE_URL`, falling back to localhost.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("LENDMEMO_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Record a new loan. Returns the generated id.
    pub async fn create_memo(&self, request: &CreateMemoRequest) -> LendResult<CreateMemoResponse> {
        let builder = self
            .client
            .post(format!("{}/api/memo", self.base_url))
            .json(request);
        self.send(builder, "create memo").await
    }

    /// Fetch a memo with its full history.
    pub async fn get_memo(&self, memo_id: &str) -> LendResult<MemoDetail> {
        let builder = self.client.get(self.memo_url(memo_id)?);
        self.send(builder, "get memo").await
    }

    /// Apply an edit on behalf of `request.editor_name`.
    pub async fn update_memo(
        &self,
        memo_id: &str,
        request: &UpdateMemoRequest,
    ) -> LendResult<MessageResponse> {
        let builder = self.client.put(self.memo_url(memo_id)?).json(request);
        self.send(builder, "update memo").await
    }

    /// Mark a loan as returned.
    pub async fn mark_returned(&self, memo_id: &str, editor_name: &str) -> LendResult<MessageResponse> {
        let request = UpdateMemoRequest::by(editor_name).status(MemoStatus::Returned);
        self.update_memo(memo_id, &request).await
    }

    /// Check that the server is up.
    pub async fn health(&self) -> LendResult<HealthResponse> {
        let builder = self.client.get(format!("{}/health", self.base_url));
        self.send(builder, "check health").await
    }

    /// `{base}/api/memo/{id}` with the id percent-encoded as one path segment.
    fn memo_url(&self, memo_id: &str) -> LendResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            LendError::Configuration(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                LendError::Configuration(format!("Base URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(["api", "memo", memo_id]);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, action: &str) -> LendResult<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| LendError::api(format!("Failed to {}: {}", action, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), action, "Request rejected");
            return Err(LendError::from_http_status(status.as_u16(), &error_message(&body)));
        }

        response
            .json()
            .await
            .map_err(|e| LendError::invalid_response(format!("Failed to parse response: {}", e)))
    }
}

/// Pull `error.message` out of an error body, or fall back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string())
}
