//! GitTLDR QA - question submission and polling orchestration
//!
//! This library drives repository Q&A for the GitTLDR dashboard: it
//! submits a user question (with optional attachments) to the backend,
//! handles answers that arrive in the same round trip, and otherwise
//! polls a status endpoint under a bounded exponential-backoff schedule
//! until the answer arrives, the attempt budget runs out, or the owning
//! session is torn down.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `orchestrator`: submission flow, polling loop, backoff schedule,
//!   task registry, and the stats-refresh gate
//! - `backend`: the `QaBackend` trait and its HTTP implementation
//! - `question`: question records and the in-memory store
//! - `attachments`: attachment descriptors and best-effort resolution
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gittldr_qa::{Config, HttpBackend, NoopSink, Orchestrator, SessionContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let backend = Arc::new(HttpBackend::new(&config.backend)?);
//!     let orchestrator = Orchestrator::new(
//!         backend,
//!         SessionContext::new("repo-1", "user-1"),
//!         &config,
//!         Arc::new(NoopSink),
//!     )?;
//!
//!     orchestrator.submit("What does this function do?", Vec::new()).await?;
//!     orchestrator.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod attachments;
pub mod backend;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod question;

// Re-export commonly used types
pub use attachments::Attachment;
pub use backend::{HttpBackend, QaBackend};
pub use config::Config;
pub use error::{QaError, Result};
pub use orchestrator::{EventSink, NoopSink, Orchestrator, SessionContext, SubmitOutcome};
pub use question::{Question, QuestionStatus, QuestionStore, RelevantFile};

#[cfg(test)]
pub mod test_utils;
