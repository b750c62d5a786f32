#![deny(missing_docs)]
//! In-process service orchestrator for the Apollo kernel.
//!
//! Installs [`KernelService`](apollo_core::KernelService)s into a
//! [`ServiceRegistry`], resolves their declared dependencies into a
//! [`DependencyGraph`], and drives start and shutdown in dependency
//! order through the [`Kernel`]. One kernel per process; there is no
//! global state.

pub mod graph;
pub mod kernel;
pub mod observer;
pub mod registry;

pub use graph::{DependencyGraph, validate_declarations};
pub use kernel::Kernel;
pub use observer::{ObserverRegistry, TracingObserver};
pub use registry::ServiceRegistry;
