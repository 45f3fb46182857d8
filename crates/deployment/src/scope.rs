//! The current deployment context.
//!
//! A context is published for exactly one run future. It travels with that
//! future across every suspension and worker hop, and is gone when the future
//! completes. Other tasks never observe it unless they are spawned through
//! [`ExecutionScope::spawn`] from inside the run.

use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::context::DeploymentContext;
use crate::error::{DeploymentError, Result};

tokio::task_local! {
    static CURRENT: Arc<DeploymentContext>;
}

pub struct ExecutionScope;

impl ExecutionScope {
    /// Bind `context` to `run` for the whole of its execution.
    ///
    /// The check happens here, before `run` is first polled. Publishing from
    /// inside a run that already has a context fails with
    /// [`DeploymentError::AlreadyPublished`].
    pub fn publish<F>(
        context: Arc<DeploymentContext>,
        run: F,
    ) -> Result<impl Future<Output = F::Output>>
    where
        F: Future,
    {
        if Self::is_published() {
            return Err(DeploymentError::AlreadyPublished);
        }

        debug!(run_id = %context.run_id(), "scope.publish");
        Ok(CURRENT.scope(context, run))
    }

    /// The context of the run this code executes in, if any.
    pub fn current() -> Option<Arc<DeploymentContext>> {
        CURRENT.try_with(Arc::clone).ok()
    }

    pub fn require() -> Result<Arc<DeploymentContext>> {
        Self::current().ok_or(DeploymentError::NoContext)
    }

    pub fn is_published() -> bool {
        CURRENT.try_with(|_| ()).is_ok()
    }

    /// Spawn a task that stays inside the current run, if there is one.
    pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match Self::current() {
            Some(context) => tokio::spawn(CURRENT.scope(context, future)),
            None => tokio::spawn(future),
        }
    }
}
