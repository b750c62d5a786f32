//! # apollo-core: Service protocol for the Apollo kernel
//!
//! This crate defines the vocabulary shared by the kernel and the
//! services it runs. It has no orchestration logic of its own; that
//! lives in `apollo-kernel`.
//!
//! | Concept | Types | What it does |
//! |---------|-------|-------------|
//! | Identity | [`ServiceKey`] | Stable, type-derived key for installing and declaring services |
//! | Service | [`KernelService`], [`Dependency`] | Hooks the kernel drives: wiring, start, stop |
//! | Wiring | [`DependencySlot`] | Typed holder for one connected provider |
//! | Lifecycle | [`ServiceState`], [`KernelEvent`], [`KernelObserver`] | State machine and progress reporting |
//! | Configuration | [`KernelConfig`] | Ordering and error-reporting policy |
//! | Errors | [`KernelError`], [`ServiceError`] | Wiring mistakes vs. misbehaving services |
//!
//! ## Dependencies are types
//!
//! A service names the *types* it needs, never instances. The kernel
//! resolves each [`ServiceKey`] against the installed services, starts
//! providers first, and hands each provider to its dependent through
//! [`KernelService::connect_to`]. Depending on "any service"
//! ([`abstract_service_key`]) or on oneself is a configuration error.

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod key;
pub mod lifecycle;
pub mod service;
pub mod slot;
pub mod state;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports for convenience
pub use config::{KernelConfig, ShutdownErrorPolicy, TieBreak};
pub use error::{ConfigError, KernelError, ServiceError, ServiceFailure};
pub use key::ServiceKey;
pub use lifecycle::{KernelEvent, KernelObserver};
pub use service::{Dependency, KernelService, ServiceIdentity, abstract_service_key};
pub use slot::DependencySlot;
pub use state::ServiceState;
