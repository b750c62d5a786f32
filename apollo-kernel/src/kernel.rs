//! The kernel: installs services and drives their collective lifecycle.

use crate::graph::{DependencyGraph, validate_declarations};
use crate::observer::ObserverRegistry;
use crate::registry::ServiceRegistry;
use apollo_core::config::{KernelConfig, ShutdownErrorPolicy};
use apollo_core::error::{KernelError, ServiceError, ServiceFailure};
use apollo_core::key::ServiceKey;
use apollo_core::lifecycle::{KernelEvent, KernelObserver};
use apollo_core::service::{Dependency, KernelService};
use apollo_core::state::ServiceState;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Accepting installs; `start` not yet called (or the graph was rejected).
    Accepting,
    /// `start` ran past graph validation.
    Running,
    /// `shutdown` ran.
    ShutDown,
}

/// In-process service orchestrator.
///
/// Services are installed in any order. `start` builds the dependency
/// graph, then walks it providers-first: each service is connected to
/// its providers and started before any of its dependents is touched.
/// `shutdown` walks the services that started in exactly the reverse
/// order, disconnecting each from its providers before stopping it.
///
/// Everything runs sequentially on the caller's task. There is no
/// timeout: a hook that never returns hangs `start` or `shutdown`.
///
/// ```
/// use apollo_core::KernelService;
/// use apollo_kernel::Kernel;
///
/// struct Log;
/// #[async_trait::async_trait]
/// impl KernelService for Log {}
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut kernel = Kernel::new();
/// kernel.install_service(Log).unwrap();
/// kernel.start().await.unwrap();
/// kernel.shutdown().await.unwrap();
/// # });
/// ```
pub struct Kernel {
    config: KernelConfig,
    registry: ServiceRegistry,
    observers: ObserverRegistry,
    phase: Phase,
    started: Vec<ServiceKey>,
    connections: HashMap<ServiceKey, Vec<Dependency>>,
}

impl Kernel {
    /// Create a kernel with the default configuration.
    pub fn new() -> Self {
        Self::with_config(KernelConfig::default())
    }

    /// Create a kernel with the given configuration.
    pub fn with_config(config: KernelConfig) -> Self {
        Self {
            config,
            registry: ServiceRegistry::new(),
            observers: ObserverRegistry::new(),
            phase: Phase::Accepting,
            started: Vec::new(),
            connections: HashMap::new(),
        }
    }

    /// Add an observer (builder style).
    pub fn with_observer(mut self, observer: Arc<dyn KernelObserver>) -> Self {
        self.add_observer(observer);
        self
    }

    /// Add an observer.
    pub fn add_observer(&mut self, observer: Arc<dyn KernelObserver>) {
        self.observers.add(observer);
    }

    /// The active configuration.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Install a service.
    ///
    /// Fails if the kernel was already started, if a service of the same
    /// concrete type is installed, or if the service declares a
    /// dependency on itself or on the abstract service type.
    pub fn install(&mut self, service: Arc<dyn KernelService>) -> Result<ServiceKey, KernelError> {
        let key = service.key();
        if self.phase != Phase::Accepting {
            return Err(KernelError::InstallAfterStart(key));
        }
        validate_declarations(
            key,
            service
                .services_to_connect_to()
                .iter()
                .chain(service.services_required().iter()),
        )?;
        let name = service.name();
        self.registry.install(service)?;
        self.emit(KernelEvent::Installed { service: name });
        Ok(key)
    }

    /// Install a service by value and keep a typed handle to it.
    pub fn install_service<S: KernelService>(&mut self, service: S) -> Result<Arc<S>, KernelError> {
        let service = Arc::new(service);
        self.install(service.clone())?;
        Ok(service)
    }

    /// Start every installed service in dependency order.
    ///
    /// Wiring errors are reported before any service is touched, and the
    /// kernel keeps accepting installs so the caller can fix the wiring
    /// and call `start` again. Once services start being touched, `start`
    /// can only run once: the first service that fails to connect or
    /// start is marked [`ServiceState::Failed`], its connections are
    /// rolled back, and the remaining services are left installed.
    /// Services that did start stay started until `shutdown`.
    pub async fn start(&mut self) -> Result<(), KernelError> {
        if self.phase != Phase::Accepting {
            return Err(KernelError::AlreadyStarted);
        }

        let graph = DependencyGraph::build(&self.registry, self.config.tie_break)?;
        self.phase = Phase::Running;
        tracing::info!(services = graph.len(), "apollo.kernel.starting");
        tracing::debug!(
            order = ?graph.order().iter().map(ServiceKey::short_name).collect::<Vec<_>>(),
            "apollo.kernel.start_order"
        );

        for key in graph.order() {
            let Some(service) = self.registry.get(key).cloned() else {
                continue;
            };
            self.registry.set_state(key, ServiceState::Starting);
            self.emit(KernelEvent::Starting {
                service: service.name(),
            });

            match self.start_one(&graph, *key, &service).await {
                Ok(()) => {
                    self.registry.set_state(key, ServiceState::Started);
                    self.started.push(*key);
                    self.emit(KernelEvent::Started {
                        service: service.name(),
                    });
                }
                Err(err) => {
                    self.registry.set_state(key, ServiceState::Failed);
                    self.emit(KernelEvent::StartFailed {
                        service: service.name(),
                        error: err.to_string(),
                    });
                    self.roll_back_connections(*key, &service);
                    return Err(err);
                }
            }
        }

        tracing::info!(services = self.started.len(), "apollo.kernel.started");
        Ok(())
    }

    async fn start_one(
        &mut self,
        graph: &DependencyGraph,
        key: ServiceKey,
        service: &Arc<dyn KernelService>,
    ) -> Result<(), KernelError> {
        let failed = |source: ServiceError| KernelError::StartupFailed {
            service: key,
            source,
        };

        for provider_key in graph.connections(&key) {
            let Some(provider) = self.registry.get(provider_key) else {
                return Err(KernelError::UnresolvedDependency {
                    service: key,
                    dependency: *provider_key,
                });
            };
            let dependency = Dependency::new(Arc::clone(provider));
            service.connect_to(&dependency).map_err(failed)?;
            self.emit(KernelEvent::Connected {
                service: service.name(),
                provider: dependency.name(),
            });
            self.connections.entry(key).or_default().push(dependency);
        }

        if self.config.verify_connections && !service.is_connected_to_all_dependencies() {
            return Err(KernelError::NotConnected { service: key });
        }

        service.start_service().await.map_err(failed)
    }

    /// Undo the wiring of a service that failed to start. Best effort:
    /// failures are logged, not reported.
    fn roll_back_connections(&mut self, key: ServiceKey, service: &Arc<dyn KernelService>) {
        let Some(connections) = self.connections.remove(&key) else {
            return;
        };
        for dependency in connections.into_iter().rev() {
            match service.disconnect_from(&dependency) {
                Ok(()) => self.emit(KernelEvent::Disconnected {
                    service: service.name(),
                    provider: dependency.name(),
                }),
                Err(err) => tracing::warn!(
                    service = %service.name(),
                    provider = %dependency.name(),
                    error = %err,
                    "apollo.kernel.rollback_failed"
                ),
            }
        }
    }

    /// Stop every started service, dependents before their providers.
    ///
    /// A failing `disconnect_from` or `stop_service` marks that service
    /// [`ServiceState::Failed`] but does not stop the walk. Failures are
    /// reported once every service had its chance, as configured by
    /// [`KernelConfig::shutdown_errors`]. Calling `shutdown` again is a
    /// no-op.
    pub async fn shutdown(&mut self) -> Result<(), KernelError> {
        if self.phase == Phase::ShutDown {
            return Ok(());
        }
        self.phase = Phase::ShutDown;
        tracing::info!(services = self.started.len(), "apollo.kernel.stopping");

        let mut failures: Vec<ServiceFailure> = Vec::new();
        let order: Vec<ServiceKey> = self.started.iter().rev().copied().collect();
        for key in order {
            if self.registry.state(&key) != Some(ServiceState::Started) {
                continue;
            }
            let Some(service) = self.registry.get(&key).cloned() else {
                continue;
            };
            self.registry.set_state(&key, ServiceState::Stopping);
            self.emit(KernelEvent::Stopping {
                service: service.name(),
            });

            let mut errors = self.disconnect_all(key, &service);
            if let Err(err) = service.stop_service().await {
                errors.push(err);
            }

            if errors.is_empty() {
                self.registry.set_state(&key, ServiceState::Stopped);
                self.emit(KernelEvent::Stopped {
                    service: service.name(),
                });
            } else {
                self.registry.set_state(&key, ServiceState::Failed);
                for error in errors {
                    self.emit(KernelEvent::StopFailed {
                        service: service.name(),
                        error: error.to_string(),
                    });
                    failures.push(ServiceFailure { service: key, error });
                }
            }
        }

        if failures.is_empty() {
            tracing::info!("apollo.kernel.stopped");
            return Ok(());
        }
        tracing::warn!(failures = failures.len(), "apollo.kernel.stopped_with_failures");
        if self.config.shutdown_errors == ShutdownErrorPolicy::LastWins {
            failures = failures.pop().into_iter().collect();
        }
        Err(KernelError::ShutdownFailed { failures })
    }

    fn disconnect_all(
        &mut self,
        key: ServiceKey,
        service: &Arc<dyn KernelService>,
    ) -> Vec<ServiceError> {
        let mut errors = Vec::new();
        let connections = self.connections.remove(&key).unwrap_or_default();
        for dependency in connections.into_iter().rev() {
            match service.disconnect_from(&dependency) {
                Ok(()) => self.emit(KernelEvent::Disconnected {
                    service: service.name(),
                    provider: dependency.name(),
                }),
                Err(err) => errors.push(err),
            }
        }
        errors
    }

    /// Lifecycle state of the service installed under `key`.
    pub fn state_of(&self, key: &ServiceKey) -> Option<ServiceState> {
        self.registry.state(key)
    }

    /// Lifecycle state of the installed service of type `S`.
    pub fn state<S: KernelService>(&self) -> Option<ServiceState> {
        self.registry.state(&ServiceKey::of::<S>())
    }

    /// The installed service of type `S`.
    pub fn service<S: KernelService>(&self) -> Option<Arc<S>> {
        self.registry
            .get(&ServiceKey::of::<S>())
            .map(|s| Dependency::new(Arc::clone(s)))
            .and_then(|d| d.downcast::<S>())
    }

    /// The installed services.
    pub fn services(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Services that started successfully, in start order.
    pub fn start_order(&self) -> &[ServiceKey] {
        &self.started
    }

    /// Whether `start` has run and `shutdown` has not.
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    fn emit(&self, event: KernelEvent) {
        self.observers.dispatch(&event);
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Kernel {
    fn drop(&mut self) {
        if self.phase == Phase::Running {
            let running = self
                .started
                .iter()
                .filter(|k| self.registry.state(k) == Some(ServiceState::Started))
                .count();
            if running > 0 {
                tracing::warn!(running, "apollo.kernel.dropped_without_shutdown");
            }
        }
    }
}
