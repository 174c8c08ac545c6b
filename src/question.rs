//! Question records and the in-memory question store
//!
//! A question moves through a three-state lifecycle: it is created as
//! `pending` when a deferred submission is accepted (or directly as
//! `completed` for immediate-mode responses) and transitions exactly once
//! to a terminal state. The store enforces that single terminal
//! transition with merge-by-id semantics.

use crate::attachments::Attachment;
use crate::error::{QaError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Lifecycle status of a question
///
/// Transitions are `Pending -> Completed` or `Pending -> Failed`, once.
/// Both `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    /// Submitted, answer not yet available
    Pending,
    /// Answer available
    Completed,
    /// Polling budget exhausted without an answer
    Failed,
}

impl QuestionStatus {
    /// Returns true for terminal states (`Completed` or `Failed`)
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuestionStatus::Completed | QuestionStatus::Failed)
    }
}

/// Canonical reference to a file the answer drew on
///
/// The backend reports relevant files in several shapes (bare path
/// strings, objects with varying key names); see [`RawRelevantFile`] for
/// the boundary normalization. Internal logic only ever sees this form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevantFile {
    /// Repository-relative file path
    pub path: String,
}

/// Raw relevant-file shape as the backend sends it
///
/// Older backend versions return bare strings; newer ones return objects
/// whose path key has drifted over time. Normalize at the boundary so no
/// downstream code branches on shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawRelevantFile {
    /// Bare path string
    Path(String),
    /// Object form with a drifting key name
    Object {
        #[serde(default)]
        path: Option<String>,
        #[serde(default, rename = "filePath")]
        file_path: Option<String>,
        #[serde(default, rename = "file_path")]
        file_path_snake: Option<String>,
        #[serde(default, rename = "fileName")]
        file_name: Option<String>,
    },
}

impl RawRelevantFile {
    /// Converts any backend shape into the canonical form
    ///
    /// Object forms are checked for known path keys in priority order;
    /// an object carrying none of them yields `None` and is dropped.
    pub fn normalize(self) -> Option<RelevantFile> {
        match self {
            RawRelevantFile::Path(path) => Some(RelevantFile { path }),
            RawRelevantFile::Object {
                path,
                file_path,
                file_path_snake,
                file_name,
            } => path
                .or(file_path)
                .or(file_path_snake)
                .or(file_name)
                .map(|path| RelevantFile { path }),
        }
    }
}

/// Normalizes a list of raw relevant files, dropping unrecognizable entries
pub fn normalize_relevant_files(raw: Vec<RawRelevantFile>) -> Vec<RelevantFile> {
    raw.into_iter().filter_map(RawRelevantFile::normalize).collect()
}

/// Client-visible projection of one submitted question
///
/// `id` is assigned by the backend on submission and never changes;
/// `query` and `attachments` are immutable after submission. The answer
/// fields are filled in by the terminal transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Backend-assigned identifier
    pub id: String,
    /// The user's question text
    pub query: String,
    /// Answer text, present once resolved
    pub answer: Option<String>,
    /// Lifecycle status
    pub status: QuestionStatus,
    /// Files the answer drew on
    #[serde(default)]
    pub relevant_files: Vec<RelevantFile>,
    /// Backend confidence score in [0, 1]
    pub confidence: Option<f64>,
    /// Backend-assigned category
    pub category: Option<String>,
    /// Backend-assigned tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Attachments supplied at submission time
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// When the client created this record
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Creates a new pending question record
    pub fn pending(id: impl Into<String>, query: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
            answer: None,
            status: QuestionStatus::Pending,
            relevant_files: Vec::new(),
            confidence: None,
            category: None,
            tags: Vec::new(),
            attachments,
            created_at: Utc::now(),
        }
    }

    /// Consumes this record and produces its completed terminal form
    pub fn complete(
        mut self,
        answer: impl Into<String>,
        relevant_files: Vec<RelevantFile>,
        confidence: Option<f64>,
        category: Option<String>,
        tags: Vec<String>,
    ) -> Self {
        self.answer = Some(answer.into());
        self.status = QuestionStatus::Completed;
        self.relevant_files = relevant_files;
        self.confidence = confidence;
        self.category = category;
        self.tags = tags;
        self
    }

    /// Consumes this record and produces its failed terminal form
    pub fn fail(mut self) -> Self {
        self.status = QuestionStatus::Failed;
        self
    }
}

/// In-memory store of question records, keyed by id
///
/// Owned by the orchestrator for the lifetime of one session; never
/// persisted. Clones share the same underlying map so polling tasks and
/// the orchestrator observe the same state.
#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    questions: Arc<Mutex<HashMap<String, Question>>>,
}

impl QuestionStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly created record
    ///
    /// # Errors
    ///
    /// Returns `QaError::Store` if a record with the same id already
    /// exists; submissions get a new backend-assigned id each time, so a
    /// duplicate indicates a backend or caller bug.
    pub fn insert(&self, question: Question) -> Result<()> {
        let mut questions = self.questions.lock().unwrap();
        if questions.contains_key(&question.id) {
            return Err(QaError::Store(format!(
                "question {} already exists",
                question.id
            ))
            .into());
        }
        questions.insert(question.id.clone(), question);
        Ok(())
    }

    /// Replaces a pending record with its terminal form, by id
    ///
    /// This is the only way a record changes after insertion, which makes
    /// the single-terminal-transition invariant checkable in one place.
    ///
    /// # Errors
    ///
    /// Returns `QaError::Store` if the id is unknown, the existing record
    /// is already terminal, or `terminal` is itself still pending.
    pub fn resolve(&self, terminal: Question) -> Result<()> {
        if !terminal.status.is_terminal() {
            return Err(QaError::Store(format!(
                "resolve called with non-terminal status for question {}",
                terminal.id
            ))
            .into());
        }

        let mut questions = self.questions.lock().unwrap();
        match questions.get(&terminal.id) {
            None => Err(QaError::Store(format!("unknown question {}", terminal.id)).into()),
            Some(existing) if existing.status.is_terminal() => Err(QaError::Store(format!(
                "question {} already terminal",
                terminal.id
            ))
            .into()),
            Some(_) => {
                questions.insert(terminal.id.clone(), terminal);
                Ok(())
            }
        }
    }

    /// Returns a clone of the record for `id`, if present
    pub fn get(&self, id: &str) -> Option<Question> {
        self.questions.lock().unwrap().get(id).cloned()
    }

    /// Returns a snapshot of all records, newest first
    pub fn snapshot(&self) -> Vec<Question> {
        let questions = self.questions.lock().unwrap();
        let mut all: Vec<Question> = questions.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Number of records in the store
    pub fn len(&self) -> usize {
        self.questions.lock().unwrap().len()
    }

    /// True if the store holds no records
    pub fn is_empty(&self) -> bool {
        self.questions.lock().unwrap().is_empty()
    }
}
