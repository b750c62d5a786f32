//! Lifecycle events and the observer interface.
//!
//! The kernel reports every state change and every wiring call as a
//! [`KernelEvent`]. Observers are passive: they see events in the order
//! the kernel produces them and cannot influence the lifecycle. This is
//! the seam for progress reporting (a splash screen, a log, a test
//! recorder).

use crate::state::ServiceState;
use serde::{Deserialize, Serialize};

/// Something the kernel did to a service.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum KernelEvent {
    /// The service was accepted by the kernel.
    Installed {
        /// Service name.
        service: String,
    },
    /// The service is about to be connected and started.
    Starting {
        /// Service name.
        service: String,
    },
    /// A provider was handed to the service.
    Connected {
        /// The dependent service.
        service: String,
        /// The provider it was connected to.
        provider: String,
    },
    /// The startup hook returned successfully.
    Started {
        /// Service name.
        service: String,
    },
    /// Connecting or starting the service failed.
    StartFailed {
        /// Service name.
        service: String,
        /// Rendered error.
        error: String,
    },
    /// The service is about to be disconnected and stopped.
    Stopping {
        /// Service name.
        service: String,
    },
    /// A provider was taken back from the service.
    Disconnected {
        /// The dependent service.
        service: String,
        /// The provider it was disconnected from.
        provider: String,
    },
    /// The shutdown hook returned successfully.
    Stopped {
        /// Service name.
        service: String,
    },
    /// Disconnecting or stopping the service failed.
    StopFailed {
        /// Service name.
        service: String,
        /// Rendered error.
        error: String,
    },
}

impl KernelEvent {
    /// Name of the service the event is about.
    pub fn service(&self) -> &str {
        match self {
            KernelEvent::Installed { service }
            | KernelEvent::Starting { service }
            | KernelEvent::Connected { service, .. }
            | KernelEvent::Started { service }
            | KernelEvent::StartFailed { service, .. }
            | KernelEvent::Stopping { service }
            | KernelEvent::Disconnected { service, .. }
            | KernelEvent::Stopped { service }
            | KernelEvent::StopFailed { service, .. } => service,
        }
    }

    /// The state the service entered, for events that change state.
    pub fn state(&self) -> Option<ServiceState> {
        match self {
            KernelEvent::Installed { .. } => Some(ServiceState::Installed),
            KernelEvent::Starting { .. } => Some(ServiceState::Starting),
            KernelEvent::Started { .. } => Some(ServiceState::Started),
            KernelEvent::Stopping { .. } => Some(ServiceState::Stopping),
            KernelEvent::Stopped { .. } => Some(ServiceState::Stopped),
            KernelEvent::StartFailed { .. } | KernelEvent::StopFailed { .. } => {
                Some(ServiceState::Failed)
            }
            KernelEvent::Connected { .. } | KernelEvent::Disconnected { .. } => None,
        }
    }
}

/// Receives kernel events.
///
/// Called synchronously from inside `start` / `shutdown`; keep it quick.
pub trait KernelObserver: Send + Sync {
    /// Called for every event, in order.
    fn on_event(&self, event: &KernelEvent);
}
