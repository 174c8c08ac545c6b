//! Error types for the GitTLDR QA orchestrator
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for QA orchestrator operations
///
/// This enum encompasses all possible errors that can occur during
/// question submission, attachment resolution, status polling, and
/// configuration loading.
#[derive(Error, Debug)]
pub enum QaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Submission failures (non-2xx or network error on the initial POST).
    /// These are user-visible; no question record is created for them.
    #[error("Submission error: {0}")]
    Submit(String),

    /// Attachment content resolution errors. Recovered locally: the
    /// attachment is included without content and submission proceeds.
    #[error("Attachment error: {0}")]
    Attachment(String),

    /// Transport or parse failure on a status poll. Consumes one polling
    /// attempt; only surfaced if the attempt budget is later exhausted.
    #[error("Poll error: {0}")]
    Poll(String),

    /// Question store merge violations (e.g. a second terminal transition
    /// for the same question id)
    #[error("Store error: {0}")]
    Store(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for QA orchestrator operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
