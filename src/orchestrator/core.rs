//! Orchestrator implementation: submission and the polling loop
//!
//! This module implements the submit operation that:
//! - Resolves attachment content best-effort before the POST
//! - Handles immediate answers in the same round trip
//! - Spawns a bounded backoff polling loop for deferred answers
//! - Guarantees every polling sequence is cancellable en masse

use crate::attachments::{resolve_attachments, Attachment};
use crate::backend::{QaBackend, SubmitRequest};
use crate::config::{Config, PollingConfig};
use crate::error::Result;
use crate::orchestrator::{BackoffSchedule, EventSink, RefreshGate, TaskRegistry};
use crate::question::{Question, QuestionStore};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Identity of the session on whose behalf questions are submitted
///
/// Both identifiers must be known before a submission can go out; until
/// then `submit` is a no-op (the host UI renders its composer disabled
/// while the repository or login state is still loading).
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Target repository identifier
    pub repository_id: Option<String>,
    /// Authenticated user identifier
    pub user_id: Option<String>,
}

impl SessionContext {
    /// Creates a fully populated session context
    pub fn new(repository_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            repository_id: Some(repository_id.into()),
            user_id: Some(user_id.into()),
        }
    }

    fn ids(&self) -> Option<(&str, &str)> {
        match (self.repository_id.as_deref(), self.user_id.as_deref()) {
            (Some(repo), Some(user)) => Some((repo, user)),
            _ => None,
        }
    }
}

/// Result of one `submit` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Preconditions not met (missing context or blank question); nothing happened
    NotReady,
    /// The response carried the answer; no polling was started
    Immediate(String),
    /// Submission accepted; a polling sequence now owns the question id
    Deferred(String),
}

/// Drives questions from "submitted" to "resolved"
///
/// One orchestrator serves one session (repository + user). Switching
/// repository means disposing this orchestrator and creating a fresh
/// one; `dispose` guarantees that no poll for the old session fires
/// afterward.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use gittldr_qa::backend::HttpBackend;
/// use gittldr_qa::config::Config;
/// use gittldr_qa::orchestrator::{NoopSink, Orchestrator, SessionContext};
///
/// # async fn example() -> gittldr_qa::error::Result<()> {
/// let config = Config::default();
/// let backend = Arc::new(HttpBackend::new(&config.backend)?);
/// let orchestrator = Orchestrator::new(
///     backend,
///     SessionContext::new("repo-1", "user-1"),
///     &config,
///     Arc::new(NoopSink),
/// )?;
/// let outcome = orchestrator.submit("What does this function do?", Vec::new()).await?;
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator {
    backend: Arc<dyn QaBackend>,
    context: SessionContext,
    polling: PollingConfig,
    schedule: BackoffSchedule,
    sink: Arc<dyn EventSink>,
    store: QuestionStore,
    registry: TaskRegistry,
    refresh_gate: Arc<RefreshGate>,
    is_submitting: AtomicBool,
}

impl Orchestrator {
    /// Creates a new orchestrator
    ///
    /// # Arguments
    ///
    /// * `backend` - Transport to the QA service
    /// * `context` - Repository and user identity for this session
    /// * `config` - Validated configuration
    /// * `sink` - Receiver for question updates and side-channel events
    ///
    /// # Errors
    ///
    /// Returns `QaError::Config` if configuration validation fails
    pub fn new(
        backend: Arc<dyn QaBackend>,
        context: SessionContext,
        config: &Config,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        config.validate()?;
        let refresh_gate = Arc::new(RefreshGate::from_config(&config.stats_refresh)?);

        Ok(Self {
            backend,
            context,
            polling: config.polling.clone(),
            schedule: BackoffSchedule::new(config.polling.base_delay()),
            sink,
            store: QuestionStore::new(),
            registry: TaskRegistry::new(),
            refresh_gate,
            is_submitting: AtomicBool::new(false),
        })
    }

    /// True while a `submit` call is in flight (drives UI disabled state)
    pub fn is_submitting(&self) -> bool {
        self.is_submitting.load(Ordering::SeqCst)
    }

    /// Snapshot of all question records for this session, newest first
    pub fn questions(&self) -> Vec<Question> {
        self.store.snapshot()
    }

    /// The record for one question id, if known
    pub fn question(&self, id: &str) -> Option<Question> {
        self.store.get(id)
    }

    /// Number of polling sequences still in flight
    pub fn active_polls(&self) -> usize {
        self.registry.active_tasks()
    }

    /// Submits a question with optional attachments
    ///
    /// Attachment content is resolved best-effort first; a failed
    /// download leaves that attachment without content rather than
    /// aborting. The immediate-answer branch produces one completed
    /// record and never schedules polling; the deferred branch produces
    /// a pending record and one polling sequence. Both branches notify
    /// the sink's question counter exactly once.
    ///
    /// # Errors
    ///
    /// Returns `QaError::Submit` if the initial POST fails; no record is
    /// created and no polling starts. The caller surfaces this to the
    /// user directly.
    pub async fn submit(
        &self,
        question_text: &str,
        attachments: Vec<Attachment>,
    ) -> Result<SubmitOutcome> {
        let Some((repository_id, user_id)) = self.context.ids() else {
            debug!("submit skipped: session context incomplete");
            return Ok(SubmitOutcome::NotReady);
        };
        let query = question_text.trim();
        if query.is_empty() {
            debug!("submit skipped: empty question");
            return Ok(SubmitOutcome::NotReady);
        }

        self.is_submitting.store(true, Ordering::SeqCst);
        let result = self
            .submit_inner(repository_id, user_id, query, attachments)
            .await;
        self.is_submitting.store(false, Ordering::SeqCst);
        result
    }

    async fn submit_inner(
        &self,
        repository_id: &str,
        user_id: &str,
        query: &str,
        mut attachments: Vec<Attachment>,
    ) -> Result<SubmitOutcome> {
        resolve_attachments(self.backend.as_ref(), &mut attachments).await;

        let request = SubmitRequest {
            repository_id: repository_id.to_string(),
            question: query.to_string(),
            user_id: user_id.to_string(),
            attachments: attachments.clone(),
        };
        let response = self.backend.submit_question(&request).await?;
        let question_id = response.question_id.clone();

        if response.is_immediate() {
            // Answer arrived in the same round trip. This is the common
            // case; no polling sequence is started for it.
            let answer = response.answer.clone().unwrap_or_default();
            let question = Question::pending(&question_id, query, attachments).complete(
                answer,
                response.relevant_files(),
                response.confidence,
                response.category.clone(),
                response.tags.clone(),
            );
            self.store.insert(question.clone())?;
            self.sink.question_updated(&question);
            self.sink.question_count_incremented();
            info!(%question_id, "question answered immediately");
            return Ok(SubmitOutcome::Immediate(question_id));
        }

        let question = Question::pending(&question_id, query, attachments);
        self.store.insert(question.clone())?;
        self.sink.question_updated(&question);
        self.sink.question_count_incremented();
        info!(%question_id, "question deferred, starting polling");

        self.spawn_polling(repository_id.to_string(), user_id.to_string(), question_id.clone());
        Ok(SubmitOutcome::Deferred(question_id))
    }

    fn spawn_polling(&self, repository_id: String, user_id: String, question_id: String) {
        let sequence = PollSequence {
            backend: Arc::clone(&self.backend),
            store: self.store.clone(),
            sink: Arc::clone(&self.sink),
            refresh_gate: Arc::clone(&self.refresh_gate),
            schedule: self.schedule,
            max_attempts: self.polling.max_attempts,
            token: self.registry.child_token(),
            repository_id,
            user_id,
            question_id,
        };
        self.registry.register(tokio::spawn(sequence.run()));
    }

    /// Cancels every in-flight polling sequence
    ///
    /// Cooperative: no poll body runs after its sequence observes the
    /// cancellation, and no update callback fires for a question whose
    /// polling was in flight at teardown time.
    pub fn dispose(&self) {
        self.registry.dispose();
    }

    /// Cancels all polling and waits for the sequences to finish
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }

    /// Waits for in-flight polling to finish without cancelling it
    pub async fn join(&self) {
        self.registry.join_all().await;
    }
}

/// One question's polling sequence
///
/// Independent of every other sequence; interleaving happens on the
/// runtime, not through shared state (the store and sink are the only
/// shared resources and both are internally synchronized).
struct PollSequence {
    backend: Arc<dyn QaBackend>,
    store: QuestionStore,
    sink: Arc<dyn EventSink>,
    refresh_gate: Arc<RefreshGate>,
    schedule: BackoffSchedule,
    max_attempts: u32,
    token: CancellationToken,
    repository_id: String,
    user_id: String,
    question_id: String,
}

impl PollSequence {
    async fn run(self) {
        for attempt in 1..=self.max_attempts {
            let delay = self.schedule.delay_for_attempt(attempt);
            tokio::select! {
                _ = self.token.cancelled() => {
                    debug!(question_id = %self.question_id, "polling cancelled");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            // Re-check at the top of every poll body: a sequence whose
            // sleep raced with cancellation must not touch the sink.
            if self.token.is_cancelled() {
                debug!(question_id = %self.question_id, "polling cancelled");
                return;
            }

            match self
                .backend
                .poll_status(&self.repository_id, &self.user_id, &self.question_id)
                .await
            {
                Ok(response) => {
                    if let Some(hit) = response.completed_answer(&self.question_id) {
                        let answer = hit.answer.clone().unwrap_or_default();
                        let relevant_files = hit.relevant_files();
                        let confidence = hit.confidence;
                        let category = hit.category.clone();
                        let tags = hit.tags.clone();
                        self.finish(attempt, |pending| {
                            pending.complete(answer, relevant_files, confidence, category, tags)
                        });
                        return;
                    }
                    debug!(
                        question_id = %self.question_id,
                        attempt,
                        "answer not ready"
                    );
                }
                // A failed poll consumes an attempt; scheduling continues.
                Err(e) => {
                    warn!(
                        question_id = %self.question_id,
                        attempt,
                        error = %e,
                        "poll attempt failed"
                    );
                }
            }
        }

        if self.token.is_cancelled() {
            return;
        }
        error!(
            question_id = %self.question_id,
            attempts = self.max_attempts,
            "polling budget exhausted, marking question failed"
        );
        self.finish(self.max_attempts, Question::fail);
    }

    /// Applies the terminal transition and notifies the sink
    ///
    /// The store's merge-by-id check makes the transition happen at most
    /// once even if a stale sequence races a newer resolution.
    fn finish(&self, attempt: u32, to_terminal: impl FnOnce(Question) -> Question) {
        let Some(pending) = self.store.get(&self.question_id) else {
            warn!(question_id = %self.question_id, "question disappeared from store");
            return;
        };
        let terminal = to_terminal(pending);
        match self.store.resolve(terminal.clone()) {
            Ok(()) => {
                self.sink.question_updated(&terminal);
                info!(
                    question_id = %self.question_id,
                    attempt,
                    status = ?terminal.status,
                    "question resolved"
                );
                if terminal.answer.is_some() && self.refresh_gate.should_refresh() {
                    self.sink.stats_refresh_requested();
                }
            }
            Err(e) => {
                warn!(
                    question_id = %self.question_id,
                    error = %e,
                    "terminal transition rejected"
                );
            }
        }
    }
}
