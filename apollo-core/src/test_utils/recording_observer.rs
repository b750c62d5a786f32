//! RecordingObserver: keeps every event for inspection.

use crate::lifecycle::{KernelEvent, KernelObserver};
use std::sync::Mutex;

/// An observer that records every event it sees.
/// Use `.events()` to inspect what was recorded.
pub struct RecordingObserver {
    events: Mutex<Vec<KernelEvent>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Return a snapshot of all recorded events.
    pub fn events(&self) -> Vec<KernelEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Recorded events about one service.
    pub fn events_for(&self, service: &str) -> Vec<KernelEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.service() == service)
            .collect()
    }
}

impl Default for RecordingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelObserver for RecordingObserver {
    fn on_event(&self, event: &KernelEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
