#![deny(missing_docs)]
//! # apollo: umbrella crate
//!
//! Provides a single import surface for the Apollo service kernel.
//! Re-exports the protocol and the orchestrator behind feature flags,
//! plus a `prelude` for the happy path.

#[cfg(feature = "core")]
pub use apollo_core;
#[cfg(feature = "kernel")]
pub use apollo_kernel;

/// Happy-path imports for writing and running services.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use apollo_core::{
        Dependency, DependencySlot, KernelConfig, KernelError, KernelEvent, KernelObserver,
        KernelService, ServiceError, ServiceKey, ServiceState, ShutdownErrorPolicy, TieBreak,
    };

    #[cfg(feature = "kernel")]
    pub use apollo_kernel::{Kernel, TracingObserver};
}
