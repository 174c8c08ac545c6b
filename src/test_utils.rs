//! Test utilities for the QA orchestrator
//!
//! This module provides a scripted in-process backend and a recording
//! event sink so unit tests can drive the orchestrator without a
//! network, under paused tokio time.

use crate::backend::{QaBackend, StatusResponse, SubmitRequest, SubmitResponse};
use crate::error::{QaError, Result};
use crate::question::Question;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Backend whose responses are scripted ahead of time
///
/// Submission and poll responses are consumed front-to-back. When the
/// poll script runs dry, an empty status response is returned, which
/// the orchestrator treats as "answer not ready yet".
#[derive(Default)]
pub struct ScriptedBackend {
    submit_responses: Mutex<VecDeque<Result<SubmitResponse>>>,
    poll_responses: Mutex<VecDeque<Result<StatusResponse>>>,
    steady_poll: Mutex<Option<StatusResponse>>,
    /// Make every attachment download fail
    pub fail_downloads: bool,
    /// Submissions received, in order
    pub submissions: Mutex<Vec<SubmitRequest>>,
    /// Number of poll calls made
    pub poll_calls: AtomicU32,
    /// Number of download calls made
    pub download_calls: AtomicU32,
}

impl ScriptedBackend {
    /// Creates a backend with no scripted responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend whose attachment downloads all fail
    pub fn with_failing_downloads() -> Self {
        Self {
            fail_downloads: true,
            ..Self::default()
        }
    }

    /// Sets the response returned once the poll script runs dry
    ///
    /// Sequences for different questions pop from one shared script, so
    /// multi-question tests use a steady response listing every
    /// completed question instead of relying on serving order.
    pub fn set_steady_poll(&self, response: StatusResponse) {
        *self.steady_poll.lock().unwrap() = Some(response);
    }

    /// Steady poll response marking each `(id, answer)` pair completed
    pub fn set_steady_completed(&self, answers: &[(&str, &str)]) {
        let questions: Vec<serde_json::Value> = answers
            .iter()
            .map(|(id, answer)| {
                serde_json::json!({"id": id, "status": "completed", "answer": answer})
            })
            .collect();
        let body = serde_json::json!({ "questions": questions });
        self.set_steady_poll(serde_json::from_value(body).unwrap());
    }

    /// Queues a submission response
    pub fn push_submit(&self, response: Result<SubmitResponse>) {
        self.submit_responses.lock().unwrap().push_back(response);
    }

    /// Queues a deferred-mode submission response for `question_id`
    pub fn push_deferred_submit(&self, question_id: &str) {
        self.push_submit(Ok(deferred_response(question_id)));
    }

    /// Queues a poll response
    pub fn push_poll(&self, response: Result<StatusResponse>) {
        self.poll_responses.lock().unwrap().push_back(response);
    }

    /// Queues `n` poll responses with no matching question
    pub fn push_empty_polls(&self, n: usize) {
        for _ in 0..n {
            self.push_poll(Ok(StatusResponse {
                questions: Vec::new(),
            }));
        }
    }

    /// Queues a poll response holding a completed answer for `question_id`
    pub fn push_completed_poll(&self, question_id: &str, answer: &str) {
        let body = serde_json::json!({
            "questions": [{"id": question_id, "status": "completed", "answer": answer}]
        });
        self.push_poll(Ok(serde_json::from_value(body).unwrap()));
    }

    /// Number of poll calls made so far
    pub fn polls(&self) -> u32 {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QaBackend for ScriptedBackend {
    async fn submit_question(&self, request: &SubmitRequest) -> Result<SubmitResponse> {
        self.submissions.lock().unwrap().push(request.clone());
        self.submit_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(QaError::Submit("no scripted response".to_string()).into()))
    }

    async fn poll_status(
        &self,
        _repository_id: &str,
        _user_id: &str,
        _question_id: &str,
    ) -> Result<StatusResponse> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(response) = self.poll_responses.lock().unwrap().pop_front() {
            return response;
        }
        if let Some(steady) = self.steady_poll.lock().unwrap().clone() {
            return Ok(steady);
        }
        Ok(StatusResponse {
            questions: Vec::new(),
        })
    }

    async fn download_attachment(&self, file_key: &str) -> Result<String> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_downloads {
            Err(QaError::Attachment(format!("scripted failure for {}", file_key)).into())
        } else {
            Ok("c2NyaXB0ZWQ=".to_string())
        }
    }
}

/// Builds an immediate-mode submission response
pub fn immediate_response(question_id: &str, answer: &str) -> SubmitResponse {
    let body = serde_json::json!({
        "mode": "api",
        "status": "completed",
        "questionId": question_id,
        "answer": answer,
    });
    serde_json::from_value(body).unwrap()
}

/// Builds a deferred-mode submission response
pub fn deferred_response(question_id: &str) -> SubmitResponse {
    serde_json::from_value(serde_json::json!({ "questionId": question_id })).unwrap()
}

/// Event sink that records every notification
#[derive(Default)]
pub struct RecordingSink {
    updates: Mutex<Vec<Question>>,
    count_increments: AtomicU32,
    stats_refreshes: AtomicU32,
}

impl RecordingSink {
    /// Creates an empty recording sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All question updates received, in order
    pub fn updates(&self) -> Vec<Question> {
        self.updates.lock().unwrap().clone()
    }

    /// Number of count-increment notifications received
    pub fn count_increments(&self) -> u32 {
        self.count_increments.load(Ordering::SeqCst)
    }

    /// Number of stats-refresh requests received
    pub fn stats_refreshes(&self) -> u32 {
        self.stats_refreshes.load(Ordering::SeqCst)
    }
}

impl crate::orchestrator::EventSink for RecordingSink {
    fn question_updated(&self, question: &Question) {
        self.updates.lock().unwrap().push(question.clone());
    }

    fn question_count_incremented(&self) {
        self.count_increments.fetch_add(1, Ordering::SeqCst);
    }

    fn stats_refresh_requested(&self) {
        self.stats_refreshes.fetch_add(1, Ordering::SeqCst);
    }
}
