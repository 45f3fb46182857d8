//! Run programs against in-memory mocks instead of a live backend.
//!
//! Runs sharing an [`ExecutionScope`](crate::ExecutionScope) must not nest;
//! start each simulation from a task that is not itself inside a run.

use engine::{MockEngine, MockMonitor, Mocks, RecordedResource};
use stack_core::{LogEntry, PropertyMap, RunOptions};
use std::sync::Arc;
use tracing::debug;

use crate::aggregate::{RunErrors, RunFailure};
use crate::callback::Callback;
use crate::context::DeploymentContext;
use crate::runner::{DeploymentRunner, EXIT_CALLBACK_FAILED};
use crate::stack::{Stack, StackProvider};
use crate::wrapper::unwrap_stack_wrapper;
use crate::Deployment;

/// Everything a simulated run produced, failed or not.
#[derive(Debug)]
pub struct TestRunResult {
    /// Registered resources in order, without the internal root wrapper.
    pub resources: Vec<RecordedResource>,
    pub outputs: PropertyMap,
    pub failure: Option<RunFailure>,
    pub exit_code: i32,
    /// Every diagnostic the engine received.
    pub diagnostics: Vec<LogEntry>,
}

impl TestRunResult {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Collapse into the strict shape: the failure, or resources and outputs.
    pub fn into_result(self) -> Result<(Vec<RecordedResource>, PropertyMap), RunFailure> {
        match self.failure {
            Some(failure) => Err(failure),
            None => Ok((self.resources, self.outputs)),
        }
    }
}

/// Simulate `callback`, returning the failure if the run reported any.
pub async fn simulate(
    mocks: Arc<dyn Mocks>,
    callback: Callback,
    options: RunOptions,
) -> Result<(Vec<RecordedResource>, PropertyMap), RunFailure> {
    simulate_report(mocks, callback, options).await.into_result()
}

/// Simulate `callback` and hand back the partial results with any failure.
pub async fn simulate_report(
    mocks: Arc<dyn Mocks>,
    callback: Callback,
    options: RunOptions,
) -> TestRunResult {
    let monitor = Arc::new(MockMonitor::new(mocks, &options));
    let engine = Arc::new(MockEngine::new());
    let context = Arc::new(DeploymentContext::new(
        options,
        Arc::new(DeploymentRunner::new()),
        monitor.clone(),
        engine.clone(),
    ));
    let run_id = context.run_id();

    let (exit_code, run_outputs, callback_failure) =
        match Deployment::run_in_context(context, callback).await {
            Ok(report) => (report.exit_code, report.outputs, report.failure),
            Err(e) => (
                EXIT_CALLBACK_FAILED,
                PropertyMap::new(),
                Some(anyhow::Error::new(e)),
            ),
        };

    let (resources, wrapper_outputs) = unwrap_stack_wrapper(monitor.resources());
    let outputs = wrapper_outputs.unwrap_or(run_outputs);

    let failure = match callback_failure {
        Some(e) => Some(RunFailure::Callback(e)),
        None => RunErrors::from(engine.errors()).into_failure(),
    };

    debug!(
        run_id = %run_id,
        resources = resources.len(),
        failed = failure.is_some(),
        "simulate.finish"
    );

    TestRunResult {
        resources,
        outputs,
        failure,
        exit_code,
        diagnostics: engine.entries(),
    }
}

/// Simulate the class-based stack `S`.
pub async fn simulate_stack<S: Stack>(mocks: Arc<dyn Mocks>, options: RunOptions) -> TestRunResult {
    simulate_report(mocks, Callback::from_stack::<S>(), options).await
}

/// Simulate the class-based stack `S`, built by `provider`.
pub async fn simulate_stack_with<S, P>(
    mocks: Arc<dyn Mocks>,
    options: RunOptions,
    provider: P,
) -> TestRunResult
where
    S: Stack,
    P: StackProvider<S>,
{
    simulate_report(mocks, Callback::from_stack_with(provider), options).await
}
