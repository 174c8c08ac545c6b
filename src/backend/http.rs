//! HTTP implementation of the QA backend
//!
//! Thin reqwest client over the three backend endpoints. Non-2xx
//! responses are mapped to the error variant of the operation they
//! belong to, so callers can tell user-visible submission failures
//! apart from poll and attachment failures that are absorbed locally.

use crate::backend::{QaBackend, StatusResponse, SubmitRequest, SubmitResponse};
use crate::config::BackendConfig;
use crate::error::{QaError, Result};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Production QA backend reachable over HTTP
///
/// # Examples
///
/// ```no_run
/// use gittldr_qa::config::BackendConfig;
/// use gittldr_qa::backend::HttpBackend;
///
/// let config = BackendConfig {
///     api_base: "http://localhost:4000".to_string(),
///     request_timeout_seconds: 30,
/// };
/// let backend = HttpBackend::new(&config);
/// assert!(backend.is_ok());
/// ```
pub struct HttpBackend {
    client: Client,
    api_base: String,
}

/// Response body of the attachment download endpoint
#[derive(Debug, Deserialize)]
struct DownloadResponse {
    content: String,
}

impl HttpBackend {
    /// Creates a new HTTP backend
    ///
    /// # Errors
    ///
    /// Returns `QaError::Config` if HTTP client initialization fails
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent("gittldr-qa/0.2.0")
            .build()
            .map_err(|e| QaError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }
}

#[async_trait]
impl QaBackend for HttpBackend {
    async fn submit_question(&self, request: &SubmitRequest) -> Result<SubmitResponse> {
        let url = self.url("/api/questions");
        debug!(%url, repository_id = %request.repository_id, "submitting question");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| QaError::Submit(format!("Failed to reach backend: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QaError::Submit(format!(
                "Backend returned {}: {}",
                status, body
            ))
            .into());
        }

        let parsed: SubmitResponse = response
            .json()
            .await
            .map_err(|e| QaError::Submit(format!("Failed to parse submission response: {}", e)))?;
        debug!(question_id = %parsed.question_id, mode = ?parsed.mode, "question accepted");
        Ok(parsed)
    }

    async fn poll_status(
        &self,
        repository_id: &str,
        user_id: &str,
        question_id: &str,
    ) -> Result<StatusResponse> {
        let url = self.url("/api/questions/status");
        debug!(%url, %question_id, "polling question status");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("repositoryId", repository_id),
                ("userId", user_id),
                ("questionId", question_id),
            ])
            .send()
            .await
            .map_err(|e| QaError::Poll(format!("Failed to reach backend: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QaError::Poll(format!("Backend returned {}: {}", status, body)).into());
        }

        response
            .json::<StatusResponse>()
            .await
            .map_err(|e| QaError::Poll(format!("Failed to parse status response: {}", e)).into())
    }

    async fn download_attachment(&self, file_key: &str) -> Result<String> {
        let url = self.url("/api/attachments/download");
        debug!(%url, %file_key, "downloading attachment content");

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "fileKey": file_key }))
            .send()
            .await
            .map_err(|e| QaError::Attachment(format!("Failed to reach backend: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(
                QaError::Attachment(format!("Backend returned {}: {}", status, body)).into(),
            );
        }

        let parsed: DownloadResponse = response.json().await.map_err(|e| {
            QaError::Attachment(format!("Failed to parse download response: {}", e))
        })?;

        // The backend promises base64; a malformed payload would poison
        // the submission body, so verify before passing it along.
        if base64::engine::general_purpose::STANDARD
            .decode(&parsed.content)
            .is_err()
        {
            warn!(%file_key, "attachment content is not valid base64");
            return Err(
                QaError::Attachment(format!("Invalid base64 content for {}", file_key)).into(),
            );
        }

        Ok(parsed.content)
    }
}
