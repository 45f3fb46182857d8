use async_trait::async_trait;
use stack_core::{
    InvokeRequest, PropertyMap, RegisterResourceRequest, RegisteredResource, Severity, Urn,
};

use crate::error::Result;

/// Where resource registrations go.
#[async_trait]
pub trait ResourceMonitor: Send + Sync {
    /// Get the name of the monitor backend
    fn name(&self) -> &'static str;

    /// Register a resource and get back its URN, physical id and output properties
    async fn register_resource(&self, request: RegisterResourceRequest)
        -> Result<RegisteredResource>;

    /// Attach declared outputs to a resource registered earlier
    async fn register_outputs(&self, urn: &Urn, outputs: PropertyMap) -> Result<()>;

    /// Call a provider function
    async fn invoke(&self, request: InvokeRequest) -> Result<PropertyMap>;
}

/// Where diagnostics go.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Get the name of the engine backend
    fn name(&self) -> &'static str;

    /// Deliver a diagnostic, optionally tied to a resource
    async fn log(&self, severity: Severity, message: &str, urn: Option<&Urn>) -> Result<()>;

    /// Deliver an error diagnostic
    async fn report_error(&self, message: &str, urn: Option<&Urn>) -> Result<()> {
        self.log(Severity::Error, message, urn).await
    }
}
