//! Program runs for declarative infrastructure.
//!
//! A program is handed over as a [`Callback`] (or a [`Stack`] type), bound to a
//! [`DeploymentContext`] through the [`ExecutionScope`], and driven to
//! completion by a [`Runner`]. The [`testing`] module runs the same machinery
//! against in-memory mocks.

pub mod aggregate;
pub mod callback;
pub mod config;
pub mod context;
pub mod error;
pub mod runner;
pub mod scope;
pub mod stack;
pub mod testing;
pub mod wrapper;

pub use aggregate::{ReportedError, RunErrors, RunFailure};
pub use callback::{Callback, CallbackFuture, CallbackKind};
pub use config::DeploymentConfig;
pub use context::{DeploymentContext, ResourceHandle};
pub use error::{DeploymentError, Result};
pub use runner::{
    DeploymentRunner, RunReport, Runner, EXIT_CALLBACK_FAILED, EXIT_ERRORS_REPORTED, EXIT_SUCCESS,
};
pub use scope::ExecutionScope;
pub use stack::{Stack, StackProvider};
pub use testing::{simulate, simulate_report, simulate_stack, simulate_stack_with, TestRunResult};

use engine::{Engine, ResourceMonitor};
use stack_core::RunOptions;
use std::sync::Arc;
use tracing::error;

/// Entry points for live runs.
pub struct Deployment;

impl Deployment {
    /// Run `callback` against the backend named by `config`.
    pub async fn run(callback: Callback, config: DeploymentConfig) -> i32 {
        let (monitor, engine) = match (config.monitor(), config.engine()) {
            (Ok(monitor), Ok(engine)) => (monitor, engine),
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %e, "Cannot start run");
                return EXIT_CALLBACK_FAILED;
            }
        };

        Self::run_with(
            callback,
            config.to_run_options(),
            Arc::new(monitor),
            Arc::new(engine),
        )
        .await
    }

    /// Run `callback` against the backend named by the `STACKRUN_*` environment.
    pub async fn run_from_env(callback: Callback) -> i32 {
        match DeploymentConfig::from_env() {
            Ok(config) => Self::run(callback, config).await,
            Err(e) => {
                error!(error = %e, "Cannot start run");
                EXIT_CALLBACK_FAILED
            }
        }
    }

    /// Run the stack `S` against the backend named by `config`.
    pub async fn run_stack<S: Stack>(config: DeploymentConfig) -> i32 {
        Self::run(Callback::from_stack::<S>(), config).await
    }

    /// Run the stack `S`, built by `provider`, against the backend named by `config`.
    pub async fn run_stack_with<S, P>(config: DeploymentConfig, provider: P) -> i32
    where
        S: Stack,
        P: StackProvider<S>,
    {
        Self::run(Callback::from_stack_with(provider), config).await
    }

    /// Run `callback` against any monitor and engine.
    pub async fn run_with(
        callback: Callback,
        options: RunOptions,
        monitor: Arc<dyn ResourceMonitor>,
        engine: Arc<dyn Engine>,
    ) -> i32 {
        let context = Arc::new(DeploymentContext::new(
            options,
            Arc::new(DeploymentRunner::new()),
            monitor,
            engine,
        ));

        match Self::run_in_context(context, callback).await {
            Ok(report) => report.exit_code,
            Err(e) => {
                error!(error = %e, "Cannot start run");
                EXIT_CALLBACK_FAILED
            }
        }
    }

    /// Publish `context` and let its runner drive `callback`.
    ///
    /// The context is current for exactly the duration of the run.
    pub async fn run_in_context(
        context: Arc<DeploymentContext>,
        callback: Callback,
    ) -> Result<RunReport> {
        let runner = context.runner();
        let run = runner.run(Arc::clone(&context), callback);
        let report = ExecutionScope::publish(context, run)?.await;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{EchoMocks, MockEngine, MockMonitor};

    #[tokio::test]
    async fn test_run_with_returns_exit_code() {
        let options = RunOptions::new("web", "dev");
        let monitor = Arc::new(MockMonitor::new(Arc::new(EchoMocks), &options));

        let code = Deployment::run_with(
            Callback::from_action(|| Ok(())),
            options,
            monitor.clone(),
            Arc::new(MockEngine::new()),
        )
        .await;

        assert_eq!(code, EXIT_SUCCESS);
        assert_eq!(monitor.resource_count(), 1);
    }

    #[tokio::test]
    async fn test_run_without_endpoints_fails() {
        let code = Deployment::run(Callback::from_action(|| Ok(())), DeploymentConfig::default()).await;
        assert_eq!(code, EXIT_CALLBACK_FAILED);
    }
}
