use engine::EngineError;
use stack_core::{CoreError, Urn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("A deployment context is already published on this task")]
    AlreadyPublished,

    #[error("No deployment context is published on this task")]
    NoContext,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Already reported to the engine against `urn`.
    #[error("Failed to register {urn}: {source}")]
    Registration {
        urn: Urn,
        source: Box<DeploymentError>,
    },

    #[error("Registration of {0} was dropped before it completed")]
    RegistrationDropped(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DeploymentError {
    /// Create a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    /// Whether the engine has already received this error as a diagnostic.
    pub fn is_reported(&self) -> bool {
        matches!(self, Self::Registration { .. })
    }
}

pub type Result<T> = std::result::Result<T, DeploymentError>;
