//! Service lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a service is in its lifecycle.
///
/// The kernel owns these states; services never set them directly.
///
/// ```text
/// Created -> Installed -> Starting -> Started -> Stopping -> Stopped
///                            |                      |
///                            +------> Failed <------+
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// Constructed but not yet accepted by a kernel.
    Created,
    /// Accepted by the kernel, waiting for `start`.
    Installed,
    /// Being connected to its dependencies and started.
    Starting,
    /// Running.
    Started,
    /// Being disconnected and stopped.
    Stopping,
    /// Stopped. Terminal.
    Stopped,
    /// A hook failed while starting or stopping. Absorbing.
    Failed,
}

impl ServiceState {
    /// Whether the transition `self -> next` is allowed.
    pub fn can_transition_to(self, next: ServiceState) -> bool {
        use ServiceState::*;
        matches!(
            (self, next),
            (Created, Installed)
                | (Installed, Starting)
                | (Starting, Started)
                | (Starting, Failed)
                | (Started, Stopping)
                | (Stopping, Stopped)
                | (Stopping, Failed)
        )
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, ServiceState::Stopped | ServiceState::Failed)
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Created => "created",
            ServiceState::Installed => "installed",
            ServiceState::Starting => "starting",
            ServiceState::Started => "started",
            ServiceState::Stopping => "stopping",
            ServiceState::Stopped => "stopped",
            ServiceState::Failed => "failed",
        };
        f.write_str(s)
    }
}
