//! Backend abstraction for the GitTLDR QA service
//!
//! The orchestrator talks to the backend through the [`QaBackend`] trait
//! so tests can substitute a scripted fake. The production implementation
//! is [`HttpBackend`], a thin reqwest client over the submission, status,
//! and attachment-download endpoints.

mod http;

pub use http::HttpBackend;

use crate::attachments::Attachment;
use crate::error::Result;
use crate::question::{normalize_relevant_files, QuestionStatus, RawRelevantFile, RelevantFile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Payload for the question submission endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    /// Target repository identifier
    pub repository_id: String,
    /// The user's question text
    pub question: String,
    /// Authenticated user identifier
    pub user_id: String,
    /// Attachments with best-effort resolved content
    pub attachments: Vec<Attachment>,
}

/// Response from the submission endpoint
///
/// Two shapes share this struct: the immediate-answer form carries a
/// completed status and the full answer payload, the deferred form only
/// a `question_id`. The `mode` discriminator is backend-versioned with no
/// documented schema contract, so [`SubmitResponse::is_immediate`]
/// validates the fields that actually matter instead of trusting it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Backend-assigned question identifier
    pub question_id: String,
    /// Ad hoc response-mode discriminator (`"api"` in current backends)
    #[serde(default)]
    pub mode: Option<String>,
    /// Question status, present in immediate-answer responses
    #[serde(default)]
    pub status: Option<String>,
    /// Answer text, present in immediate-answer responses
    #[serde(default)]
    pub answer: Option<String>,
    /// Raw relevant-file entries, normalized via [`SubmitResponse::relevant_files`]
    #[serde(default)]
    pub relevant_files: Vec<RawRelevantFile>,
    /// Confidence score in [0, 1]
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Classification category
    #[serde(default)]
    pub category: Option<String>,
    /// Classification tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SubmitResponse {
    /// True when the response already carries the final answer
    ///
    /// Requires a completed status and a non-empty answer; the `mode`
    /// field alone is not trusted. A response claiming `mode: "api"`
    /// without an answer falls back to deferred handling.
    pub fn is_immediate(&self) -> bool {
        let completed = self.status.as_deref() == Some("completed");
        let has_answer = self
            .answer
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty());
        if completed != has_answer || (self.mode.as_deref() == Some("api")) != completed {
            debug!(
                question_id = %self.question_id,
                mode = ?self.mode,
                status = ?self.status,
                "inconsistent submission response discriminator"
            );
        }
        completed && has_answer
    }

    /// Normalized relevant files from the raw wire shapes
    pub fn relevant_files(&self) -> Vec<RelevantFile> {
        normalize_relevant_files(self.relevant_files.clone())
    }
}

/// Response from the status endpoint
///
/// Carries every question for the (repository, user) pair; the caller
/// filters client-side for the id it is polling.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    /// All known questions for the queried repository and user
    #[serde(default)]
    pub questions: Vec<StatusQuestion>,
}

impl StatusResponse {
    /// Finds a completed record with a non-empty answer for `question_id`
    pub fn completed_answer(&self, question_id: &str) -> Option<&StatusQuestion> {
        self.questions.iter().find(|q| {
            q.id == question_id
                && q.status == Some(QuestionStatus::Completed)
                && q.answer.as_deref().is_some_and(|a| !a.trim().is_empty())
        })
    }
}

/// One question record as the status endpoint reports it
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuestion {
    /// Question identifier
    pub id: String,
    /// Lifecycle status; `None` when the backend sends an unknown value
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<QuestionStatus>,
    /// Answer text, once available
    #[serde(default)]
    pub answer: Option<String>,
    /// Raw relevant-file entries
    #[serde(default)]
    pub relevant_files: Vec<RawRelevantFile>,
    /// Confidence score in [0, 1]
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Classification category
    #[serde(default)]
    pub category: Option<String>,
    /// Classification tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl StatusQuestion {
    /// Normalized relevant files from the raw wire shapes
    pub fn relevant_files(&self) -> Vec<RelevantFile> {
        normalize_relevant_files(self.relevant_files.clone())
    }
}

/// Deserializes a status string, mapping unknown values to `None`
///
/// The status vocabulary has grown before; an unrecognized value must
/// not fail the whole poll response.
fn lenient_status<'de, D>(deserializer: D) -> std::result::Result<Option<QuestionStatus>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| match s.as_str() {
        "pending" => Some(QuestionStatus::Pending),
        "completed" => Some(QuestionStatus::Completed),
        "failed" => Some(QuestionStatus::Failed),
        _ => None,
    }))
}

/// Transport seam between the orchestrator and the QA backend
///
/// All three endpoints are opaque collaborators; implementations decide
/// the wire details. [`HttpBackend`] is the production implementation.
#[async_trait]
pub trait QaBackend: Send + Sync {
    /// Submits a question for answering
    async fn submit_question(&self, request: &SubmitRequest) -> Result<SubmitResponse>;

    /// Fetches the current status of all questions for a repository/user pair
    async fn poll_status(
        &self,
        repository_id: &str,
        user_id: &str,
        question_id: &str,
    ) -> Result<StatusResponse>;

    /// Downloads stored attachment content as base64
    async fn download_attachment(&self, file_key: &str) -> Result<String>;
}
