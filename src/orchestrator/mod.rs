//! Question submission and polling orchestration
//!
//! This module drives a single question from "submitted" to "resolved":
//! it submits the question to the backend, handles immediate answers in
//! the same round trip, and otherwise runs a bounded exponential-backoff
//! polling loop until the answer arrives, the attempt budget is
//! exhausted, or the owning session is torn down.

mod backoff;
mod core;
mod events;
mod registry;
mod throttle;

pub use backoff::BackoffSchedule;
pub use self::core::{Orchestrator, SessionContext, SubmitOutcome};
pub use events::{EventSink, NoopSink};
pub use registry::TaskRegistry;
pub use throttle::{RefreshGate, RefreshPolicy};
