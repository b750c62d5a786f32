//! Test doubles for services and observers.
//!
//! Available behind the `test-utils` feature flag.

mod journal;
mod probe_service;
mod recording_observer;

pub use journal::{Journal, JournalEntry};
pub use probe_service::ProbeService;
pub use recording_observer::RecordingObserver;
