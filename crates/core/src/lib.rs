//! Shared domain types for stack runs.
//!
//! Every other crate in the workspace speaks in these types: property maps,
//! URNs, registration requests and responses, diagnostics and run options.

pub mod domain;
pub mod error;

pub use domain::diagnostic::{CapturedError, LogEntry, Severity};
pub use domain::options::{RunOptions, DEFAULT_PROJECT, DEFAULT_STACK};
pub use domain::resource::{
    InvokeRequest, PropertyMap, RegisterResourceRequest, RegisteredResource, Urn,
    STACK_WRAPPER_TYPE,
};
pub use error::{CoreError, Result};
