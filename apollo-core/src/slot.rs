//! Typed holders for connected dependencies.

use crate::key::ServiceKey;
use crate::service::{Dependency, KernelService};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Holds the provider of one dependency capability.
///
/// A service keeps one slot per dependency it needs. The slot declares
/// the dependency (`key`), takes the provider when the kernel offers it
/// (`accept`), gives it up on disconnect (`release`), and reports
/// whether it is filled.
///
/// ```
/// use apollo_core::{Dependency, DependencySlot, KernelService, ServiceError, ServiceKey};
/// use std::sync::Arc;
///
/// struct Clock;
/// #[async_trait::async_trait]
/// impl KernelService for Clock {}
///
/// struct Scheduler {
///     clock: DependencySlot<Clock>,
/// }
///
/// #[async_trait::async_trait]
/// impl KernelService for Scheduler {
///     fn services_to_connect_to(&self) -> Vec<ServiceKey> {
///         vec![self.clock.key()]
///     }
///     fn connect_to(&self, dependency: &Dependency) -> Result<(), ServiceError> {
///         self.clock.accept(dependency);
///         Ok(())
///     }
///     fn is_connected_to_all_dependencies(&self) -> bool {
///         self.clock.is_connected()
///     }
/// }
///
/// let scheduler = Scheduler { clock: DependencySlot::new() };
/// scheduler.connect_to(&Dependency::new(Arc::new(Clock))).unwrap();
/// assert!(scheduler.is_connected_to_all_dependencies());
/// ```
pub struct DependencySlot<T: KernelService> {
    provider: RwLock<Option<Arc<T>>>,
}

impl<T: KernelService> DependencySlot<T> {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self {
            provider: RwLock::new(None),
        }
    }

    /// Key of the dependency this slot holds.
    pub fn key(&self) -> ServiceKey {
        ServiceKey::of::<T>()
    }

    /// Take the provider if it is a `T`. Returns whether it was taken.
    pub fn accept(&self, dependency: &Dependency) -> bool {
        match dependency.downcast::<T>() {
            Some(provider) => {
                *self.provider.write().unwrap_or_else(PoisonError::into_inner) = Some(provider);
                true
            }
            None => false,
        }
    }

    /// Drop the provider if `dependency` is the `T` this slot holds.
    /// Returns whether anything was released.
    pub fn release(&self, dependency: &Dependency) -> bool {
        if !dependency.is::<T>() {
            return false;
        }
        self.provider
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    /// The connected provider, if any.
    pub fn get(&self) -> Option<Arc<T>> {
        self.provider
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a provider is connected.
    pub fn is_connected(&self) -> bool {
        self.provider
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl<T: KernelService> Default for DependencySlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: KernelService> fmt::Debug for DependencySlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencySlot")
            .field("key", &self.key())
            .field("connected", &self.is_connected())
            .finish()
    }
}
