use async_trait::async_trait;
use engine::{Engine, ResourceMonitor};
use events::{Event, EventBus};
use stack_core::{
    InvokeRequest, PropertyMap, RegisterResourceRequest, RegisteredResource, RunOptions, Severity,
    Urn,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{DeploymentError, Result};
use crate::runner::Runner;
use crate::scope::ExecutionScope;

/// Everything one run talks to.
pub struct DeploymentContext {
    options: RunOptions,
    runner: Arc<dyn Runner>,
    monitor: Arc<dyn ResourceMonitor>,
    engine: Arc<CountingEngine>,
    event_bus: Option<EventBus>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl DeploymentContext {
    pub fn new(
        options: RunOptions,
        runner: Arc<dyn Runner>,
        monitor: Arc<dyn ResourceMonitor>,
        engine: Arc<dyn Engine>,
    ) -> Self {
        Self {
            options,
            runner,
            monitor,
            engine: Arc::new(CountingEngine::new(engine)),
            event_bus: None,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// The context of the run this code executes in, if any.
    pub fn current() -> Option<Arc<Self>> {
        ExecutionScope::current()
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn run_id(&self) -> Uuid {
        self.options.run_id
    }

    pub fn runner(&self) -> Arc<dyn Runner> {
        Arc::clone(&self.runner)
    }

    pub fn monitor(&self) -> &Arc<dyn ResourceMonitor> {
        &self.monitor
    }

    /// The run's engine. Errors sent through it count toward the exit code.
    pub fn engine(&self) -> Arc<dyn Engine> {
        self.engine.clone()
    }

    /// URN the monitor will assign to a registration in this run.
    pub fn urn_for(&self, type_token: &str, name: &str) -> Urn {
        Urn::new(&self.options.project, &self.options.stack, type_token, name)
    }

    /// Register a resource. A failure is also reported to the engine against
    /// the resource's URN and comes back as [`DeploymentError::Registration`].
    pub async fn register_resource(
        &self,
        request: RegisterResourceRequest,
    ) -> Result<RegisteredResource> {
        let urn = self.urn_for(&request.type_token, &request.name);
        if let Err(e) = request.validate() {
            return Err(self.registration_failed(urn, e.into()).await);
        }
        let type_token = request.type_token.clone();

        match self.monitor.register_resource(request).await {
            Ok(registered) => {
                info!(run_id = %self.run_id(), urn = %registered.urn, "resource.registered");
                self.emit(Event::ResourceRegistered {
                    run_id: self.run_id(),
                    urn: registered.urn.clone(),
                    type_token,
                });
                Ok(registered)
            }
            Err(e) => Err(self.registration_failed(urn, e.into()).await),
        }
    }

    async fn registration_failed(&self, urn: Urn, source: DeploymentError) -> DeploymentError {
        self.report_error(&source.to_string(), Some(&urn)).await;
        DeploymentError::Registration {
            urn,
            source: Box::new(source),
        }
    }

    /// Register a resource without waiting for the answer.
    ///
    /// The run does not finish until every spawned registration has settled.
    pub fn spawn_registration(self: &Arc<Self>, request: RegisterResourceRequest) -> ResourceHandle {
        let urn = self.urn_for(&request.type_token, &request.name);
        let (sender, receiver) = oneshot::channel();
        let context = Arc::clone(self);

        let handle = ExecutionScope::spawn(async move {
            let result = context.register_resource(request).await;
            let _ = sender.send(result);
        });
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handle);

        debug!(run_id = %self.run_id(), urn = %urn, "resource.spawned");
        ResourceHandle { urn, receiver }
    }

    /// Wait for every spawned registration, including ones spawned meanwhile.
    pub async fn await_pending(&self) {
        loop {
            let handles =
                std::mem::take(&mut *self.pending.lock().unwrap_or_else(|e| e.into_inner()));
            if handles.is_empty() {
                return;
            }

            for handle in handles {
                if let Err(e) = handle.await {
                    warn!(run_id = %self.run_id(), error = %e, "registration task failed");
                }
            }
        }
    }

    pub async fn register_outputs(&self, urn: &Urn, outputs: PropertyMap) -> Result<()> {
        debug!(run_id = %self.run_id(), urn = %urn, outputs = outputs.len(), "resource.outputs");
        self.monitor.register_outputs(urn, outputs).await?;
        Ok(())
    }

    pub async fn invoke(&self, request: InvokeRequest) -> Result<PropertyMap> {
        debug!(run_id = %self.run_id(), token = %request.token, "invoke");
        Ok(self.monitor.invoke(request).await?)
    }

    /// Send a diagnostic to the engine. Delivery failures are logged, never raised.
    pub async fn log(&self, severity: Severity, message: &str, urn: Option<&Urn>) {
        if severity == Severity::Error {
            error!(run_id = %self.run_id(), urn = ?urn.map(Urn::as_str), "{}", message);
        }

        if let Err(e) = self.engine.log(severity, message, urn).await {
            warn!(
                run_id = %self.run_id(),
                engine = self.engine.name(),
                error = %e,
                "Failed to deliver diagnostic"
            );
        }

        self.emit(Event::DiagnosticReported {
            run_id: self.run_id(),
            severity,
            message: message.to_string(),
            urn: urn.cloned(),
        });
    }

    pub async fn report_error(&self, message: &str, urn: Option<&Urn>) {
        self.log(Severity::Error, message, urn).await;
    }

    /// Number of error diagnostics reported so far in this run.
    pub fn error_count(&self) -> usize {
        self.engine.errors.load(Ordering::SeqCst)
    }

    pub(crate) fn emit(&self, event: Event) {
        if let Some(bus) = &self.event_bus {
            bus.emit(event);
        }
    }
}

impl std::fmt::Debug for DeploymentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentContext")
            .field("options", &self.options)
            .field("runner", &self.runner.name())
            .field("monitor", &self.monitor.name())
            .field("engine", &self.engine.name())
            .field("reported_errors", &self.error_count())
            .finish()
    }
}

/// Counts the error diagnostics that pass through to the wrapped engine.
struct CountingEngine {
    inner: Arc<dyn Engine>,
    errors: AtomicUsize,
}

impl CountingEngine {
    fn new(inner: Arc<dyn Engine>) -> Self {
        Self {
            inner,
            errors: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Engine for CountingEngine {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn log(&self, severity: Severity, message: &str, urn: Option<&Urn>) -> engine::Result<()> {
        if severity == Severity::Error {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.log(severity, message, urn).await
    }
}

/// A registration that was spawned rather than awaited.
#[derive(Debug)]
pub struct ResourceHandle {
    urn: Urn,
    receiver: oneshot::Receiver<Result<RegisteredResource>>,
}

impl ResourceHandle {
    /// The URN this run derives for the resource. The monitor's answer from
    /// [`resolve`](Self::resolve) is authoritative if the two differ.
    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    pub async fn resolve(self) -> Result<RegisteredResource> {
        self.receiver
            .await
            .map_err(|_| DeploymentError::RegistrationDropped(self.urn.to_string()))?
    }
}
