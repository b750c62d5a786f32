//! Application bootstrap: install a handful of services, start them in
//! dependency order, push a message through, and shut down.
//!
//! Run with:
//!
//! ```sh
//! RUST_LOG=debug cargo run --example bootstrap -p apollo
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use apollo::prelude::*;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Logging sink: no dependencies, collects lines
// ---------------------------------------------------------------------------

#[derive(Default)]
struct LogSink {
    lines: Mutex<Vec<String>>,
}

impl LogSink {
    fn write(&self, line: impl Into<String>) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.into());
    }

    fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl KernelService for LogSink {
    async fn start_service(&self) -> Result<(), ServiceError> {
        self.write("log sink open");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Message pipeline: background worker that logs every message it sees
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MessagePipeline {
    log: DependencySlot<LogSink>,
    sender: Mutex<Option<mpsc::UnboundedSender<String>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MessagePipeline {
    fn publish(&self, message: impl Into<String>) -> Result<(), ServiceError> {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = sender
            .as_ref()
            .ok_or_else(|| ServiceError::Unavailable("pipeline is not running".into()))?;
        sender
            .send(message.into())
            .map_err(|e| ServiceError::Failed(e.to_string()))
    }
}

#[async_trait]
impl KernelService for MessagePipeline {
    fn services_to_connect_to(&self) -> Vec<ServiceKey> {
        vec![self.log.key()]
    }

    fn connect_to(&self, dependency: &Dependency) -> Result<(), ServiceError> {
        self.log.accept(dependency);
        Ok(())
    }

    fn disconnect_from(&self, dependency: &Dependency) -> Result<(), ServiceError> {
        self.log.release(dependency);
        Ok(())
    }

    fn is_connected_to_all_dependencies(&self) -> bool {
        self.log.is_connected()
    }

    async fn start_service(&self) -> Result<(), ServiceError> {
        let log = self
            .log
            .get()
            .ok_or_else(|| ServiceError::Unavailable("log sink".into()))?;
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let worker = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                log.write(format!("pipeline: {message}"));
            }
        });
        *self.sender.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(worker);
        Ok(())
    }

    async fn stop_service(&self) -> Result<(), ServiceError> {
        // Dropping the sender ends the worker loop once the queue drains.
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            worker
                .await
                .map_err(|e| ServiceError::Failed(format!("pipeline worker: {e}")))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// UI notifications: publishes through the pipeline, needs the sink up
// ---------------------------------------------------------------------------

#[derive(Default)]
struct UiNotifier {
    pipeline: DependencySlot<MessagePipeline>,
}

impl UiNotifier {
    fn notify(&self, text: &str) -> Result<(), ServiceError> {
        match self.pipeline.get() {
            Some(pipeline) => pipeline.publish(format!("notify {text}")),
            None => Err(ServiceError::Unavailable("message pipeline".into())),
        }
    }
}

#[async_trait]
impl KernelService for UiNotifier {
    fn services_to_connect_to(&self) -> Vec<ServiceKey> {
        vec![self.pipeline.key()]
    }

    fn services_required(&self) -> Vec<ServiceKey> {
        vec![ServiceKey::of::<LogSink>()]
    }

    fn connect_to(&self, dependency: &Dependency) -> Result<(), ServiceError> {
        self.pipeline.accept(dependency);
        Ok(())
    }

    fn disconnect_from(&self, dependency: &Dependency) -> Result<(), ServiceError> {
        self.pipeline.release(dependency);
        Ok(())
    }

    fn is_connected_to_all_dependencies(&self) -> bool {
        self.pipeline.is_connected()
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = KernelConfig::from_json(r#"{"shutdown_errors": "aggregate"}"#)?;
    let mut kernel = Kernel::with_config(config).with_observer(Arc::new(TracingObserver::new()));

    // Installation order is irrelevant; the kernel sorts it out.
    let ui = kernel.install_service(UiNotifier::default())?;
    kernel.install_service(MessagePipeline::default())?;
    let log = kernel.install_service(LogSink::default())?;

    if let Err(err) = kernel.start().await {
        tracing::error!(error = %err, "startup failed");
        kernel.shutdown().await?;
        return Err(err.into());
    }

    ui.notify("project loaded")?;
    kernel.shutdown().await?;

    for line in log.lines() {
        println!("{line}");
    }
    Ok(())
}
