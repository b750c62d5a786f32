//! Journal: a shared, ordered log of hook calls.

use std::sync::{Arc, Mutex};

/// One hook call made on a [`ProbeService`](super::ProbeService).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    /// `connect_to` on `service` with `provider`.
    Connect {
        /// The dependent.
        service: String,
        /// The provider.
        provider: String,
    },
    /// `start_service` on the named service.
    Start(String),
    /// `disconnect_from` on `service` with `provider`.
    Disconnect {
        /// The dependent.
        service: String,
        /// The provider.
        provider: String,
    },
    /// `stop_service` on the named service.
    Stop(String),
}

/// Shared log that several probes write into, so tests can assert on
/// the global order of hook calls.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<JournalEntry>>>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, entry: JournalEntry) {
        self.entries.lock().unwrap().push(entry);
    }

    /// Snapshot of every entry so far.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Names of started services, in start order.
    pub fn starts(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                JournalEntry::Start(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Names of stopped services, in stop order.
    pub fn stops(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                JournalEntry::Stop(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    /// `(service, provider)` pairs passed to `connect_to`, in order.
    pub fn connections(&self) -> Vec<(String, String)> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                JournalEntry::Connect { service, provider } => Some((service, provider)),
                _ => None,
            })
            .collect()
    }

    /// `(service, provider)` pairs passed to `disconnect_from`, in order.
    pub fn disconnections(&self) -> Vec<(String, String)> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                JournalEntry::Disconnect { service, provider } => Some((service, provider)),
                _ => None,
            })
            .collect()
    }

    /// Position of an entry, if it was recorded.
    pub fn position(&self, entry: &JournalEntry) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }
}
