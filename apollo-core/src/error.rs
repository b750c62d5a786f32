//! Error types for services and the kernel.

use crate::key::ServiceKey;
use std::fmt;
use thiserror::Error;

/// Errors raised by a service from one of its hooks.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The hook failed.
    #[error("service failed: {0}")]
    Failed(String),

    /// A resource the service needs is not available.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Catch-all. Include context.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A single service that failed while the kernel was stopping it.
#[derive(Debug)]
pub struct ServiceFailure {
    /// The service that failed.
    pub service: ServiceKey,
    /// What went wrong.
    pub error: ServiceError,
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.service, self.error)
    }
}

/// Errors returned by the kernel.
///
/// Configuration errors (wiring mistakes) are reported before any
/// service hook runs; runtime errors name the service that misbehaved.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum KernelError {
    /// A service of the same type is already installed.
    #[error("a service of type {0} is already installed")]
    DuplicateServiceType(ServiceKey),

    /// A service declared a dependency on its own type.
    #[error("service {0} declares a dependency on itself")]
    SelfDependency(ServiceKey),

    /// A service declared a dependency on the abstract service marker.
    #[error("service {0} declares a dependency on the abstract service type")]
    DependencyOnAbstractBase(ServiceKey),

    /// A declared dependency is not installed.
    #[error("service {service} depends on {dependency}, which is not installed")]
    UnresolvedDependency {
        /// The dependent service.
        service: ServiceKey,
        /// The missing dependency.
        dependency: ServiceKey,
    },

    /// The dependency graph contains a cycle.
    #[error("cyclic dependency: {}", format_cycle(.cycle))]
    CyclicDependency {
        /// Members of one offending cycle, each depending on the next;
        /// the last member depends on the first.
        cycle: Vec<ServiceKey>,
    },

    /// A service failed while being connected or started.
    #[error("service {service} failed to start: {source}")]
    StartupFailed {
        /// The service that failed.
        service: ServiceKey,
        /// The error raised by the service.
        #[source]
        source: ServiceError,
    },

    /// A service reported that it is not connected to all of its
    /// dependencies after every provider was offered to it.
    #[error("service {service} is not connected to all of its dependencies")]
    NotConnected {
        /// The service that refused to start.
        service: ServiceKey,
    },

    /// One or more services failed while stopping. Every other service
    /// was still stopped.
    #[error("{} service(s) failed to stop: {}", .failures.len(), format_failures(.failures))]
    ShutdownFailed {
        /// The failures, in the order they occurred.
        failures: Vec<ServiceFailure>,
    },

    /// `install` was called after `start`.
    #[error("cannot install {0}: the kernel has already been started")]
    InstallAfterStart(ServiceKey),

    /// `start` was called more than once.
    #[error("the kernel has already been started")]
    AlreadyStarted,
}

impl KernelError {
    /// Whether this error is a wiring mistake detected before any
    /// service ran, as opposed to a service misbehaving at runtime.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            KernelError::DuplicateServiceType(_)
                | KernelError::SelfDependency(_)
                | KernelError::DependencyOnAbstractBase(_)
                | KernelError::UnresolvedDependency { .. }
                | KernelError::CyclicDependency { .. }
        )
    }

    /// The service this error is attributed to, if any.
    pub fn service(&self) -> Option<ServiceKey> {
        match self {
            KernelError::DuplicateServiceType(key)
            | KernelError::SelfDependency(key)
            | KernelError::DependencyOnAbstractBase(key)
            | KernelError::InstallAfterStart(key) => Some(*key),
            KernelError::UnresolvedDependency { service, .. }
            | KernelError::StartupFailed { service, .. }
            | KernelError::NotConnected { service } => Some(*service),
            _ => None,
        }
    }
}

/// Configuration errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration could not be parsed.
    #[error("invalid kernel configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

fn format_cycle(cycle: &[ServiceKey]) -> String {
    let mut names: Vec<String> = cycle.iter().map(ServiceKey::short_name).collect();
    if let Some(first) = names.first().cloned() {
        names.push(first);
    }
    names.join(" -> ")
}

fn format_failures(failures: &[ServiceFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
