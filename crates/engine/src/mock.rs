//! In-memory stand-ins for the live backend.
//!
//! [`MockMonitor`] answers registrations from caller-supplied [`Mocks`] hooks and
//! keeps every registered resource in order. [`MockEngine`] keeps every
//! diagnostic in order. Nothing leaves the process.

use async_trait::async_trait;
use stack_core::{
    CapturedError, InvokeRequest, LogEntry, PropertyMap, RegisterResourceRequest,
    RegisteredResource, RunOptions, Severity, Urn,
};
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::traits::{Engine, ResourceMonitor};

/// What a mock hook sees for a resource registration.
#[derive(Debug, Clone, PartialEq)]
pub struct MockResourceArgs {
    pub type_token: String,
    pub name: String,
    pub inputs: PropertyMap,
    pub provider: Option<String>,
    pub urn: Urn,
    pub custom: bool,
    pub dry_run: bool,
}

/// What a mock hook answers for a resource registration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockResourceResult {
    /// Physical id; `None` falls back to `"{name}_id"` outside of dry runs.
    pub id: Option<String>,
    pub state: PropertyMap,
}

impl MockResourceResult {
    pub fn new(id: impl Into<String>, state: PropertyMap) -> Self {
        Self {
            id: Some(id.into()),
            state,
        }
    }

    /// Echo the inputs back as state, with the conventional `"{name}_id"`.
    pub fn echo(args: &MockResourceArgs) -> Self {
        Self::new(format!("{}_id", args.name), args.inputs.clone())
    }
}

/// What a mock hook sees for a provider function call.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCallArgs {
    pub token: String,
    pub args: PropertyMap,
    pub provider: Option<String>,
}

/// Caller-supplied hooks that synthesize backend responses.
#[async_trait]
pub trait Mocks: Send + Sync {
    async fn new_resource(&self, args: MockResourceArgs) -> anyhow::Result<MockResourceResult>;

    async fn call(&self, args: MockCallArgs) -> anyhow::Result<PropertyMap> {
        let _ = args;
        Ok(PropertyMap::new())
    }
}

/// Hooks that echo inputs back as outputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoMocks;

#[async_trait]
impl Mocks for EchoMocks {
    async fn new_resource(&self, args: MockResourceArgs) -> anyhow::Result<MockResourceResult> {
        Ok(MockResourceResult::echo(&args))
    }
}

/// A resource as the in-memory monitor saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedResource {
    pub urn: Urn,
    pub id: Option<String>,
    pub type_token: String,
    pub name: String,
    pub inputs: PropertyMap,
    pub outputs: PropertyMap,
    pub provider: Option<String>,
    pub parent: Option<Urn>,
    pub custom: bool,
}

impl RecordedResource {
    pub fn is_stack_wrapper(&self) -> bool {
        self.type_token == stack_core::STACK_WRAPPER_TYPE
    }
}

pub struct MockMonitor {
    mocks: Arc<dyn Mocks>,
    project: String,
    stack: String,
    dry_run: bool,
    resources: RwLock<Vec<RecordedResource>>,
}

impl MockMonitor {
    pub fn new(mocks: Arc<dyn Mocks>, options: &RunOptions) -> Self {
        Self {
            mocks,
            project: options.project.clone(),
            stack: options.stack.clone(),
            dry_run: options.dry_run,
            resources: RwLock::new(Vec::new()),
        }
    }

    /// Every registered resource, in registration order.
    pub fn resources(&self) -> Vec<RecordedResource> {
        self.resources
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn resource_count(&self) -> usize {
        self.resources
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn contains(&self, urn: &Urn) -> bool {
        self.resources
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|r| &r.urn == urn)
    }
}

#[async_trait]
impl ResourceMonitor for MockMonitor {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn register_resource(
        &self,
        request: RegisterResourceRequest,
    ) -> Result<RegisteredResource> {
        let urn = Urn::new(&self.project, &self.stack, &request.type_token, &request.name);
        if self.contains(&urn) {
            return Err(EngineError::DuplicateResource(urn));
        }

        // The wrapper only carries outputs; hooks never see it.
        let result = if request.is_stack_wrapper() {
            MockResourceResult::default()
        } else {
            let args = MockResourceArgs {
                type_token: request.type_token.clone(),
                name: request.name.clone(),
                inputs: request.inputs.clone(),
                provider: request.provider.clone(),
                urn: urn.clone(),
                custom: request.custom,
                dry_run: self.dry_run,
            };
            self.mocks
                .new_resource(args)
                .await
                .map_err(|e| EngineError::mock_failed(urn.as_str(), e))?
        };

        let id = match result.id {
            Some(id) => Some(id),
            None if self.dry_run || request.is_stack_wrapper() => None,
            None => Some(format!("{}_id", request.name)),
        };

        let recorded = RecordedResource {
            urn: urn.clone(),
            id: id.clone(),
            type_token: request.type_token,
            name: request.name,
            inputs: request.inputs,
            outputs: result.state.clone(),
            provider: request.provider,
            parent: request.parent,
            custom: request.custom,
        };

        {
            let mut resources = self.resources.write().unwrap_or_else(|e| e.into_inner());
            if resources.iter().any(|r| r.urn == urn) {
                return Err(EngineError::DuplicateResource(urn));
            }
            resources.push(recorded);
        }

        debug!(urn = %urn, id = ?id, "mock.resource.registered");

        Ok(RegisteredResource {
            urn,
            id,
            outputs: result.state,
        })
    }

    async fn register_outputs(&self, urn: &Urn, outputs: PropertyMap) -> Result<()> {
        let mut resources = self.resources.write().unwrap_or_else(|e| e.into_inner());
        let resource = resources
            .iter_mut()
            .find(|r| &r.urn == urn)
            .ok_or_else(|| EngineError::UnknownResource(urn.clone()))?;

        debug!(urn = %urn, outputs = outputs.len(), "mock.resource.outputs");
        resource.outputs = outputs;
        Ok(())
    }

    async fn invoke(&self, request: InvokeRequest) -> Result<PropertyMap> {
        let token = request.token.clone();
        self.mocks
            .call(MockCallArgs {
                token: request.token,
                args: request.args,
                provider: request.provider,
            })
            .await
            .map_err(|e| EngineError::mock_failed(token, e))
    }
}

/// Engine that records diagnostics instead of shipping them anywhere.
#[derive(Default)]
pub struct MockEngine {
    entries: RwLock<Vec<LogEntry>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every diagnostic, in report order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Error diagnostics only, in report order.
    pub fn errors(&self) -> Vec<CapturedError> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| e.is_error())
            .cloned()
            .map(CapturedError::from)
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| e.is_error())
            .count()
    }
}

#[async_trait]
impl Engine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn log(&self, severity: Severity, message: &str, urn: Option<&Urn>) -> Result<()> {
        debug!(severity = severity.as_str(), message = %message, "mock.engine.log");
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(LogEntry::new(severity, message, urn.cloned()));
        Ok(())
    }
}
