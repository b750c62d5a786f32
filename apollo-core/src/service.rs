//! The KernelService protocol: what every installable service implements.

use crate::error::ServiceError;
use crate::key::ServiceKey;
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type identity for services.
///
/// Blanket-implemented for every `'static + Send + Sync` type, so
/// service authors never write it. It is what lets the kernel key a
/// `dyn KernelService` by its concrete type and lets dependents get
/// their providers back as concrete `Arc<T>`.
pub trait ServiceIdentity: Any + Send + Sync {
    /// Key of the concrete type.
    fn service_key(&self) -> ServiceKey;

    /// Upcast for downcasting to the concrete type.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> ServiceIdentity for T {
    fn service_key(&self) -> ServiceKey {
        ServiceKey::of::<T>()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A unit of functionality the kernel installs, wires and runs.
///
/// Dependencies are declared by type (as [`ServiceKey`]s), never by
/// instance. The kernel resolves them against the installed services,
/// hands each provider to the dependent through [`connect_to`], and only
/// then calls [`start_service`]. On shutdown the order is reversed:
/// [`disconnect_from`] for each provider, then [`stop_service`].
///
/// Wiring hooks take `&self`; services keep wiring state behind
/// interior mutability, usually a [`DependencySlot`] per dependency.
///
/// Each hook is called at most once per lifecycle.
///
/// [`connect_to`]: KernelService::connect_to
/// [`disconnect_from`]: KernelService::disconnect_from
/// [`start_service`]: KernelService::start_service
/// [`stop_service`]: KernelService::stop_service
/// [`DependencySlot`]: crate::slot::DependencySlot
#[async_trait]
pub trait KernelService: ServiceIdentity {
    /// Display name used in events and logs. Defaults to the short type name.
    fn name(&self) -> String {
        self.service_key().short_name()
    }

    /// Services this one must be handed through `connect_to` before it starts.
    fn services_to_connect_to(&self) -> Vec<ServiceKey> {
        Vec::new()
    }

    /// Services that must be installed and started first but are not
    /// wired into this one.
    fn services_required(&self) -> Vec<ServiceKey> {
        Vec::new()
    }

    /// Receive a provider this service declared in `services_to_connect_to`.
    fn connect_to(&self, dependency: &Dependency) -> Result<(), ServiceError> {
        let _ = dependency;
        Ok(())
    }

    /// Release a provider previously received through `connect_to`.
    fn disconnect_from(&self, dependency: &Dependency) -> Result<(), ServiceError> {
        let _ = dependency;
        Ok(())
    }

    /// Whether every declared connect dependency has been received.
    ///
    /// The default suits services without dependencies. Services that
    /// declare any must compute this from the `connect_to` calls they
    /// have seen.
    fn is_connected_to_all_dependencies(&self) -> bool {
        true
    }

    /// Startup hook, called once all dependencies are started and connected.
    async fn start_service(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Shutdown hook, called after this service was disconnected from
    /// its providers and after every dependent has stopped.
    async fn stop_service(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

impl dyn KernelService {
    /// Key of the concrete service type behind this trait object.
    pub fn key(&self) -> ServiceKey {
        self.service_key()
    }

    /// Whether the concrete service type is `T`.
    pub fn is<T: KernelService>(&self) -> bool {
        self.key() == ServiceKey::of::<T>()
    }
}

/// The key that stands for "any service".
///
/// Depending on it is rejected: a dependency must name a concrete type.
pub fn abstract_service_key() -> ServiceKey {
    ServiceKey::of::<dyn KernelService>()
}

/// A provider handed to a dependent through `connect_to` / `disconnect_from`.
#[derive(Clone)]
pub struct Dependency {
    key: ServiceKey,
    service: Arc<dyn KernelService>,
}

impl Dependency {
    /// Wrap an installed provider.
    pub fn new(service: Arc<dyn KernelService>) -> Self {
        Self {
            key: service.key(),
            service,
        }
    }

    /// Key of the provider's concrete type.
    pub fn key(&self) -> ServiceKey {
        self.key
    }

    /// Provider display name.
    pub fn name(&self) -> String {
        self.service.name()
    }

    /// The provider as a trait object.
    pub fn service(&self) -> &Arc<dyn KernelService> {
        &self.service
    }

    /// Whether the provider's concrete type is `T`.
    pub fn is<T: KernelService>(&self) -> bool {
        self.key == ServiceKey::of::<T>()
    }

    /// The provider as its concrete type, if it is a `T`.
    pub fn downcast<T: KernelService>(&self) -> Option<Arc<T>> {
        if !self.is::<T>() {
            return None;
        }
        let any = <dyn KernelService as ServiceIdentity>::into_any(Arc::clone(&self.service));
        Arc::downcast::<T>(any).ok()
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("key", &self.key)
            .field("name", &self.name())
            .finish()
    }
}
