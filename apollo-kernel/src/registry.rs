//! The set of installed services and their lifecycle states.

use apollo_core::error::KernelError;
use apollo_core::key::ServiceKey;
use apollo_core::service::KernelService;
use apollo_core::state::ServiceState;
use std::collections::HashMap;
use std::sync::Arc;

struct Entry {
    key: ServiceKey,
    service: Arc<dyn KernelService>,
    state: ServiceState,
}

/// Installed services keyed by concrete type, in installation order.
///
/// The registry is the authoritative owner of each service's
/// [`ServiceState`]. Only the kernel mutates it.
pub struct ServiceRegistry {
    entries: Vec<Entry>,
    positions: HashMap<ServiceKey, usize>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Add a service. Fails without changing the registry if a service
    /// of the same concrete type is already installed.
    pub fn install(&mut self, service: Arc<dyn KernelService>) -> Result<ServiceKey, KernelError> {
        let key = service.key();
        if self.positions.contains_key(&key) {
            return Err(KernelError::DuplicateServiceType(key));
        }
        self.positions.insert(key, self.entries.len());
        self.entries.push(Entry {
            key,
            service,
            state: ServiceState::Installed,
        });
        Ok(key)
    }

    /// The service installed under `key`.
    pub fn get(&self, key: &ServiceKey) -> Option<&Arc<dyn KernelService>> {
        self.entry(key).map(|e| &e.service)
    }

    /// Whether a service is installed under `key`.
    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.positions.contains_key(key)
    }

    /// Current lifecycle state of the service installed under `key`.
    pub fn state(&self, key: &ServiceKey) -> Option<ServiceState> {
        self.entry(key).map(|e| e.state)
    }

    /// Position of the service in installation order.
    pub fn installation_index(&self, key: &ServiceKey) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// Installed services in installation order.
    pub fn iter(&self) -> impl Iterator<Item = (ServiceKey, &Arc<dyn KernelService>)> {
        self.entries.iter().map(|e| (e.key, &e.service))
    }

    /// Installed keys in installation order.
    pub fn keys(&self) -> Vec<ServiceKey> {
        self.entries.iter().map(|e| e.key).collect()
    }

    /// Number of installed services.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is installed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn set_state(&mut self, key: &ServiceKey, next: ServiceState) {
        if let Some(&pos) = self.positions.get(key) {
            let entry = &mut self.entries[pos];
            debug_assert!(
                entry.state.can_transition_to(next),
                "illegal transition for {}: {} -> {}",
                entry.key,
                entry.state,
                next
            );
            entry.state = next;
        }
    }

    fn entry(&self, key: &ServiceKey) -> Option<&Entry> {
        self.positions.get(key).map(|&pos| &self.entries[pos])
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
