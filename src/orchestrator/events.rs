//! Event sink for orchestrator side effects
//!
//! The orchestrator reports state changes to its host through this
//! trait instead of returning them: updates arrive from spawned polling
//! tasks long after `submit` has returned.

use crate::question::Question;

/// Receiver for orchestrator notifications
///
/// For a given question id, `question_updated` is called with the
/// pending record first and with exactly one terminal record after;
/// immediate-mode questions get a single completed call. There is no
/// ordering guarantee across different question ids.
///
/// All methods default to no-ops so hosts implement only what they use.
pub trait EventSink: Send + Sync {
    /// A question record was created or reached a terminal state
    fn question_updated(&self, question: &Question) {
        let _ = question;
    }

    /// A submission was accepted (once per question, in both modes)
    fn question_count_incremented(&self) {}

    /// A completion passed the stats refresh gate
    fn stats_refresh_requested(&self) {}
}

/// Sink that discards every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {}
