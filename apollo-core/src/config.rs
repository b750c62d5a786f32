//! Kernel configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// How the kernel orders services that have no dependency relation
/// between them.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Earlier installed services start first.
    #[default]
    InstallationOrder,
    /// Services start in type-name order.
    TypeName,
}

/// How shutdown failures are reported once every service had its
/// chance to stop.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownErrorPolicy {
    /// Report every failure.
    #[default]
    Aggregate,
    /// Report only the last failure.
    LastWins,
}

/// Kernel configuration. Every field has a default, so an empty JSON
/// object is a valid configuration.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Ordering of independent services.
    pub tie_break: TieBreak,

    /// Reporting of shutdown failures.
    pub shutdown_errors: ShutdownErrorPolicy,

    /// Ask each service whether it is connected to all of its
    /// dependencies before starting it.
    pub verify_connections: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::default(),
            shutdown_errors: ShutdownErrorPolicy::default(),
            verify_connections: true,
        }
    }
}

impl KernelConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the tie-break rule.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Set the shutdown error policy.
    pub fn with_shutdown_errors(mut self, policy: ShutdownErrorPolicy) -> Self {
        self.shutdown_errors = policy;
        self
    }

    /// Enable or disable the connectivity check.
    pub fn with_verify_connections(mut self, verify: bool) -> Self {
        self.verify_connections = verify;
        self
    }
}
