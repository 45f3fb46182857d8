//! Run lifecycle events
//!
//! This crate provides the event bus and event types that let observers
//! follow a run as it starts, registers resources, reports diagnostics and
//! finishes.

mod bus;
mod types;

pub use bus::{EventBus, RunSubscription};
pub use types::*;
