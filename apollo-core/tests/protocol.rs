//! Acceptance tests for the service protocol crate.
//!
//! Tests cover:
//! - Trait object safety (Arc<dyn Trait> is Send + Sync)
//! - Identity of services behind trait objects
//! - Dependency handles and typed slots
//! - Error classification and rendering
//! - Event and configuration serialization

use apollo_core::*;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Object Safety: Arc<dyn Trait> compiles and is Send + Sync
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn _assert_send_sync<T: Send + Sync>() {}

#[test]
fn arc_kernel_service_is_send_sync() {
    _assert_send_sync::<Arc<dyn KernelService>>();
}

#[test]
fn arc_kernel_observer_is_send_sync() {
    _assert_send_sync::<Arc<dyn KernelObserver>>();
}

#[test]
fn dependency_is_send_sync() {
    _assert_send_sync::<Dependency>();
}

#[test]
fn kernel_error_is_send_sync() {
    _assert_send_sync::<KernelError>();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Services
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct LogSink;

#[async_trait]
impl KernelService for LogSink {}

struct MessageBus {
    log: DependencySlot<LogSink>,
}

#[async_trait]
impl KernelService for MessageBus {
    fn name(&self) -> String {
        "bus".into()
    }

    fn services_to_connect_to(&self) -> Vec<ServiceKey> {
        vec![self.log.key()]
    }

    fn connect_to(&self, dependency: &Dependency) -> Result<(), ServiceError> {
        if self.log.accept(dependency) {
            Ok(())
        } else {
            Err(ServiceError::Failed(format!(
                "unexpected dependency {}",
                dependency.name()
            )))
        }
    }

    fn disconnect_from(&self, dependency: &Dependency) -> Result<(), ServiceError> {
        self.log.release(dependency);
        Ok(())
    }

    fn is_connected_to_all_dependencies(&self) -> bool {
        self.log.is_connected()
    }

    async fn start_service(&self) -> Result<(), ServiceError> {
        match self.log.get() {
            Some(_) => Ok(()),
            None => Err(ServiceError::Unavailable("log sink".into())),
        }
    }
}

fn bus() -> MessageBus {
    MessageBus {
        log: DependencySlot::new(),
    }
}

#[test]
fn trait_object_keeps_concrete_identity() {
    let svc: Arc<dyn KernelService> = Arc::new(LogSink);
    assert_eq!(svc.key(), ServiceKey::of::<LogSink>());
    assert_ne!(svc.key(), abstract_service_key());
    assert_eq!(svc.name(), "LogSink");
}

#[test]
fn declared_dependencies_are_keys() {
    assert_eq!(bus().services_to_connect_to(), vec![ServiceKey::of::<LogSink>()]);
    assert!(bus().services_required().is_empty());
}

#[tokio::test]
async fn slot_wiring_round_trip() {
    let bus = bus();
    assert!(!bus.is_connected_to_all_dependencies());
    assert!(bus.start_service().await.is_err());

    let log = Dependency::new(Arc::new(LogSink));
    bus.connect_to(&log).unwrap();
    assert!(bus.is_connected_to_all_dependencies());
    bus.start_service().await.unwrap();

    bus.disconnect_from(&log).unwrap();
    assert!(!bus.is_connected_to_all_dependencies());
}

struct Clock;

#[async_trait]
impl KernelService for Clock {}

#[test]
fn unexpected_provider_is_refused() {
    let bus = bus();
    let err = bus
        .connect_to(&Dependency::new(Arc::new(Clock)))
        .unwrap_err();
    assert!(err.to_string().contains("unexpected dependency Clock"));
    assert!(!bus.is_connected_to_all_dependencies());
}

#[test]
fn dependency_reports_provider_identity() {
    let dep = Dependency::new(Arc::new(bus()));
    assert_eq!(dep.key(), ServiceKey::of::<MessageBus>());
    assert_eq!(dep.name(), "bus");
    assert!(dep.is::<MessageBus>());
    assert!(dep.service().is::<MessageBus>());
    assert!(format!("{dep:?}").contains("bus"));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn configuration_errors_are_distinguished() {
    let key = ServiceKey::of::<LogSink>();
    let config = [
        KernelError::DuplicateServiceType(key),
        KernelError::SelfDependency(key),
        KernelError::DependencyOnAbstractBase(key),
        KernelError::UnresolvedDependency {
            service: key,
            dependency: ServiceKey::of::<MessageBus>(),
        },
        KernelError::CyclicDependency { cycle: vec![key] },
    ];
    assert!(config.iter().all(KernelError::is_configuration_error));

    let runtime = [
        KernelError::StartupFailed {
            service: key,
            source: ServiceError::Failed("x".into()),
        },
        KernelError::NotConnected { service: key },
        KernelError::ShutdownFailed { failures: vec![] },
        KernelError::AlreadyStarted,
        KernelError::InstallAfterStart(key),
    ];
    assert!(!runtime.iter().any(KernelError::is_configuration_error));
}

#[test]
fn shutdown_failure_lists_each_service() {
    let err = KernelError::ShutdownFailed {
        failures: vec![
            ServiceFailure {
                service: ServiceKey::of::<MessageBus>(),
                error: ServiceError::Failed("flush".into()),
            },
            ServiceFailure {
                service: ServiceKey::of::<LogSink>(),
                error: ServiceError::Unavailable("disk".into()),
            },
        ],
    };
    let msg = err.to_string();
    assert!(msg.starts_with("2 service(s) failed to stop"));
    assert!(msg.contains("flush"));
    assert!(msg.contains("disk"));
}

#[test]
fn service_error_wraps_foreign_errors() {
    let io = std::io::Error::other("socket closed");
    let err: ServiceError = ServiceError::Other(Box::new(io));
    assert_eq!(err.to_string(), "socket closed");
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Serialization
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn service_state_serializes_snake_case() {
    assert_eq!(serde_json::to_value(ServiceState::Started).unwrap(), json!("started"));
    let state: ServiceState = serde_json::from_value(json!("failed")).unwrap();
    assert_eq!(state, ServiceState::Failed);
}

#[test]
fn start_failure_event_shape() {
    let event = KernelEvent::StartFailed {
        service: "bus".into(),
        error: "boom".into(),
    };
    assert_eq!(
        serde_json::to_value(&event).unwrap(),
        json!({"event": "start_failed", "service": "bus", "error": "boom"})
    );
}

#[test]
fn config_round_trips_through_json() {
    let config = KernelConfig::default()
        .with_tie_break(TieBreak::TypeName)
        .with_shutdown_errors(ShutdownErrorPolicy::LastWins)
        .with_verify_connections(false);
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(KernelConfig::from_json(&json).unwrap(), config);
}
