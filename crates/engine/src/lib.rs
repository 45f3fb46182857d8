//! Capabilities a run talks to: the resource monitor that registrations go
//! to, and the engine that collects diagnostics.
//!
//! Two implementations ship with the crate. [`HttpMonitor`] / [`HttpEngine`]
//! reach a live backend; [`MockMonitor`] / [`MockEngine`] record everything in
//! memory and synthesize registration responses from caller-supplied [`Mocks`].

pub mod error;
pub mod http;
pub mod mock;
pub mod traits;

pub use error::{EngineError, Result};
pub use http::{HttpEngine, HttpMonitor};
pub use mock::{
    EchoMocks, MockCallArgs, MockEngine, MockMonitor, MockResourceArgs, MockResourceResult, Mocks,
    RecordedResource,
};
pub use traits::{Engine, ResourceMonitor};
