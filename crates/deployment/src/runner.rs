use async_trait::async_trait;
use events::Event;
use stack_core::{PropertyMap, RegisterResourceRequest, Urn, STACK_WRAPPER_TYPE};
use std::sync::Arc;
use tracing::{error, info};

use crate::callback::{Callback, CallbackKind};
use crate::context::DeploymentContext;
use crate::error::DeploymentError;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_CALLBACK_FAILED: i32 = 1;
pub const EXIT_ERRORS_REPORTED: i32 = 32;

/// Outcome of driving one callback.
#[derive(Debug)]
pub struct RunReport {
    pub exit_code: i32,
    pub outputs: PropertyMap,
    /// The callback's own error, when it failed.
    pub failure: Option<anyhow::Error>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.exit_code == EXIT_SUCCESS
    }
}

/// Drives a normalized callback against a deployment context.
#[async_trait]
pub trait Runner: Send + Sync {
    /// Get the name of the runner
    fn name(&self) -> &'static str;

    /// Run the callback to completion and produce the process exit code
    async fn run(&self, context: Arc<DeploymentContext>, callback: Callback) -> RunReport;
}

/// The stock runner.
///
/// Free-function callbacks get a root wrapper resource that receives their
/// outputs; stacks are their own root.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeploymentRunner;

impl DeploymentRunner {
    pub fn new() -> Self {
        Self
    }

    async fn register_wrapper(&self, context: &DeploymentContext) -> anyhow::Result<Urn> {
        let request =
            RegisterResourceRequest::component(STACK_WRAPPER_TYPE, context.options().root_name());
        Ok(context.register_resource(request).await?.urn)
    }

    fn finish(&self, context: &DeploymentContext, report: RunReport) -> RunReport {
        info!(
            run_id = %context.run_id(),
            exit_code = report.exit_code,
            outputs = report.outputs.len(),
            errors = context.error_count(),
            "run.finish"
        );
        context.emit(Event::RunFinished {
            run_id: context.run_id(),
            exit_code: report.exit_code,
        });
        report
    }
}

#[async_trait]
impl Runner for DeploymentRunner {
    fn name(&self) -> &'static str {
        "deployment"
    }

    async fn run(&self, context: Arc<DeploymentContext>, callback: Callback) -> RunReport {
        let options = context.options();
        info!(
            run_id = %options.run_id,
            project = %options.project,
            stack = %options.stack,
            dry_run = options.dry_run,
            kind = callback.kind().as_str(),
            "run.start"
        );
        context.emit(Event::RunStarted {
            run_id: options.run_id,
            project: options.project.clone(),
            stack: options.stack.clone(),
            dry_run: options.dry_run,
        });

        let wrapper = match callback.kind() {
            CallbackKind::Function => match self.register_wrapper(&context).await {
                Ok(urn) => Some(urn),
                Err(e) => {
                    let report = RunReport {
                        exit_code: EXIT_CALLBACK_FAILED,
                        outputs: PropertyMap::new(),
                        failure: Some(e),
                    };
                    return self.finish(&context, report);
                }
            },
            CallbackKind::Stack => None,
        };

        let result = callback.invoke().await;
        context.await_pending().await;

        let report = match result {
            Ok(outputs) => {
                if let Some(urn) = &wrapper {
                    if let Err(e) = context.register_outputs(urn, outputs.clone()).await {
                        context.report_error(&e.to_string(), Some(urn)).await;
                    }
                }

                let exit_code = if context.error_count() > 0 {
                    EXIT_ERRORS_REPORTED
                } else {
                    EXIT_SUCCESS
                };
                RunReport {
                    exit_code,
                    outputs,
                    failure: None,
                }
            }
            Err(e) => {
                error!(run_id = %context.run_id(), error = %e, "run.callback_failed");
                let reported = e
                    .downcast_ref::<DeploymentError>()
                    .is_some_and(DeploymentError::is_reported);
                if !reported {
                    context
                        .report_error(&format!("{e:#}"), wrapper.as_ref())
                        .await;
                }
                RunReport {
                    exit_code: EXIT_CALLBACK_FAILED,
                    outputs: PropertyMap::new(),
                    failure: Some(e),
                }
            }
        };

        self.finish(&context, report)
    }
}
