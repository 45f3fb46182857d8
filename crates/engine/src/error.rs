use stack_core::Urn;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Resource already registered: {0}")]
    DuplicateResource(Urn),

    #[error("Resource not found: {0}")]
    UnknownResource(Urn),

    #[error("Mock hook failed for {target}: {reason}")]
    MockFailed { target: String, reason: String },
}

impl EngineError {
    /// Create a mock hook failure for a resource URN or invoke token.
    pub fn mock_failed(target: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::MockFailed {
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_failed_display() {
        let err = EngineError::mock_failed("urn:stackrun:s::p::t:index:T::n", "quota exceeded");
        assert_eq!(
            err.to_string(),
            "Mock hook failed for urn:stackrun:s::p::t:index:T::n: quota exceeded"
        );
    }
}
