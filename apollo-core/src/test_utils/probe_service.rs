//! ProbeService: a configurable service that journals every hook call.

use super::journal::{Journal, JournalEntry};
use crate::error::ServiceError;
use crate::key::ServiceKey;
use crate::service::{Dependency, KernelService};
use async_trait::async_trait;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Mutex;

/// A service whose dependencies and failures are set up by the test.
///
/// Services are keyed by type, so each probe in a test needs its own
/// marker type `M`: `ProbeService<A>` and `ProbeService<B>` are two
/// different services.
///
/// ```
/// use apollo_core::test_utils::{Journal, ProbeService};
///
/// struct Db;
/// struct Api;
///
/// let journal = Journal::new();
/// let db = ProbeService::<Db>::new("db", &journal);
/// let api = ProbeService::<Api>::new("api", &journal).connects_to::<ProbeService<Db>>();
/// # let _ = (db, api);
/// ```
pub struct ProbeService<M: 'static> {
    label: String,
    journal: Journal,
    connect: Vec<ServiceKey>,
    require: Vec<ServiceKey>,
    connected: Mutex<Vec<ServiceKey>>,
    fail_connect: bool,
    fail_start: bool,
    fail_disconnect: bool,
    fail_stop: bool,
    _marker: PhantomData<fn() -> M>,
}

impl<M: 'static> ProbeService<M> {
    /// Create a probe with no dependencies that never fails.
    pub fn new(label: impl Into<String>, journal: &Journal) -> Self {
        Self {
            label: label.into(),
            journal: journal.clone(),
            connect: Vec::new(),
            require: Vec::new(),
            connected: Mutex::new(Vec::new()),
            fail_connect: false,
            fail_start: false,
            fail_disconnect: false,
            fail_stop: false,
            _marker: PhantomData,
        }
    }

    /// Declare a connect dependency on `T`.
    pub fn connects_to<T: ?Sized + 'static>(self) -> Self {
        self.connects_to_key(ServiceKey::of::<T>())
    }

    /// Declare a connect dependency by key.
    pub fn connects_to_key(mut self, key: ServiceKey) -> Self {
        self.connect.push(key);
        self
    }

    /// Declare a required (started first, never connected) dependency on `T`.
    pub fn requires<T: ?Sized + 'static>(mut self) -> Self {
        self.require.push(ServiceKey::of::<T>());
        self
    }

    /// Make `connect_to` fail.
    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Make `start_service` fail.
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Make `disconnect_from` fail.
    pub fn failing_disconnect(mut self) -> Self {
        self.fail_disconnect = true;
        self
    }

    /// Make `stop_service` fail.
    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    /// Keys of the providers currently connected.
    pub fn connected(&self) -> Vec<ServiceKey> {
        self.connected.lock().unwrap().clone()
    }
}

impl<M: 'static> fmt::Debug for ProbeService<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeService")
            .field("label", &self.label)
            .field("connect", &self.connect)
            .field("require", &self.require)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<M: 'static> KernelService for ProbeService<M> {
    fn name(&self) -> String {
        self.label.clone()
    }

    fn services_to_connect_to(&self) -> Vec<ServiceKey> {
        self.connect.clone()
    }

    fn services_required(&self) -> Vec<ServiceKey> {
        self.require.clone()
    }

    fn connect_to(&self, dependency: &Dependency) -> Result<(), ServiceError> {
        self.journal.record(JournalEntry::Connect {
            service: self.label.clone(),
            provider: dependency.name(),
        });
        if self.fail_connect {
            return Err(ServiceError::Failed(format!(
                "{} refused {}",
                self.label,
                dependency.name()
            )));
        }
        self.connected.lock().unwrap().push(dependency.key());
        Ok(())
    }

    fn disconnect_from(&self, dependency: &Dependency) -> Result<(), ServiceError> {
        self.journal.record(JournalEntry::Disconnect {
            service: self.label.clone(),
            provider: dependency.name(),
        });
        self.connected
            .lock()
            .unwrap()
            .retain(|key| *key != dependency.key());
        if self.fail_disconnect {
            return Err(ServiceError::Failed(format!(
                "{} could not release {}",
                self.label,
                dependency.name()
            )));
        }
        Ok(())
    }

    fn is_connected_to_all_dependencies(&self) -> bool {
        let connected = self.connected.lock().unwrap();
        self.connect.iter().all(|key| connected.contains(key))
    }

    async fn start_service(&self) -> Result<(), ServiceError> {
        self.journal.record(JournalEntry::Start(self.label.clone()));
        if self.fail_start {
            return Err(ServiceError::Failed(format!("{} failed to start", self.label)));
        }
        Ok(())
    }

    async fn stop_service(&self) -> Result<(), ServiceError> {
        self.journal.record(JournalEntry::Stop(self.label.clone()));
        if self.fail_stop {
            return Err(ServiceError::Failed(format!("{} failed to stop", self.label)));
        }
        Ok(())
    }
}
