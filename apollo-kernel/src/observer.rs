//! Observer dispatch and the tracing-backed observer.

use apollo_core::lifecycle::{KernelEvent, KernelObserver};
use std::sync::Arc;

/// Dispatches kernel events to an ordered list of observers.
///
/// Observers are called in the order they were added.
pub struct ObserverRegistry {
    observers: Vec<Arc<dyn KernelObserver>>,
}

impl ObserverRegistry {
    /// Create a new empty observer registry.
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Add an observer to the end of the list.
    pub fn add(&mut self, observer: Arc<dyn KernelObserver>) {
        self.observers.push(observer);
    }

    /// Deliver an event to every observer.
    pub fn dispatch(&self, event: &KernelEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observers are registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`KernelObserver`] that emits structured [`tracing`] events.
///
/// # Levels
///
/// | Event | Level |
/// |-------|-------|
/// | Connected, Disconnected, Starting, Stopping | `DEBUG` |
/// | Installed, Started, Stopped | `INFO` |
/// | StopFailed | `WARN` |
/// | StartFailed | `ERROR` |
pub struct TracingObserver;

impl TracingObserver {
    /// Create a new `TracingObserver`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelObserver for TracingObserver {
    fn on_event(&self, event: &KernelEvent) {
        match event {
            KernelEvent::Installed { service } => {
                tracing::info!(service = %service, "apollo.service.installed");
            }
            KernelEvent::Starting { service } => {
                tracing::debug!(service = %service, "apollo.service.starting");
            }
            KernelEvent::Connected { service, provider } => {
                tracing::debug!(service = %service, provider = %provider, "apollo.service.connected");
            }
            KernelEvent::Started { service } => {
                tracing::info!(service = %service, "apollo.service.started");
            }
            KernelEvent::StartFailed { service, error } => {
                tracing::error!(service = %service, error = %error, "apollo.service.start_failed");
            }
            KernelEvent::Stopping { service } => {
                tracing::debug!(service = %service, "apollo.service.stopping");
            }
            KernelEvent::Disconnected { service, provider } => {
                tracing::debug!(service = %service, provider = %provider, "apollo.service.disconnected");
            }
            KernelEvent::Stopped { service } => {
                tracing::info!(service = %service, "apollo.service.stopped");
            }
            KernelEvent::StopFailed { service, error } => {
                tracing::warn!(service = %service, error = %error, "apollo.service.stop_failed");
            }
            _ => {
                // `KernelEvent` is non_exhaustive; newer variants are not traced.
            }
        }
    }
}
