use stack_core::{CapturedError, Urn};
use thiserror::Error;

/// An error diagnostic reported during a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ReportedError {
    pub message: String,
    pub urn: Option<Urn>,
}

impl From<CapturedError> for ReportedError {
    fn from(captured: CapturedError) -> Self {
        Self {
            message: captured.message,
            urn: captured.urn,
        }
    }
}

/// Why a simulated run failed.
#[derive(Debug, Error)]
pub enum RunFailure {
    /// The program itself returned an error.
    #[error(transparent)]
    Callback(anyhow::Error),

    #[error(transparent)]
    Reported(ReportedError),

    #[error("{} errors were reported: {}", .0.len(), join_messages(.0))]
    Aggregate(Vec<ReportedError>),
}

fn join_messages(errors: &[ReportedError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl RunFailure {
    /// Reported errors behind this failure, in report order.
    pub fn errors(&self) -> &[ReportedError] {
        match self {
            Self::Callback(_) => &[],
            Self::Reported(error) => std::slice::from_ref(error),
            Self::Aggregate(errors) => errors,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Callback(e) => vec![e.to_string()],
            _ => self.errors().iter().map(|e| e.message.clone()).collect(),
        }
    }

    pub fn is_callback(&self) -> bool {
        matches!(self, Self::Callback(_))
    }
}

/// Errors collected from one run, in report order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunErrors(Vec<ReportedError>);

impl RunErrors {
    pub fn new(errors: Vec<ReportedError>) -> Self {
        Self(errors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[ReportedError] {
        &self.0
    }

    /// None for no errors, the error itself for one, an aggregate otherwise.
    pub fn into_failure(mut self) -> Option<RunFailure> {
        match self.0.len() {
            0 => None,
            1 => self.0.pop().map(RunFailure::Reported),
            _ => Some(RunFailure::Aggregate(self.0)),
        }
    }

    pub fn into_result(self) -> Result<(), RunFailure> {
        match self.into_failure() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

impl From<Vec<CapturedError>> for RunErrors {
    fn from(captured: Vec<CapturedError>) -> Self {
        Self(captured.into_iter().map(ReportedError::from).collect())
    }
}

impl FromIterator<ReportedError> for RunErrors {
    fn from_iter<I: IntoIterator<Item = ReportedError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(messages: &[&str]) -> RunErrors {
        messages
            .iter()
            .map(|m| ReportedError {
                message: m.to_string(),
                urn: None,
            })
            .collect()
    }

    #[test]
    fn test_no_errors() {
        assert!(errors(&[]).into_failure().is_none());
        assert!(errors(&[]).into_result().is_ok());
    }

    #[test]
    fn test_single_error_keeps_message() {
        let failure = errors(&["bucket name taken"]).into_failure().unwrap();

        assert!(matches!(failure, RunFailure::Reported(_)));
        assert_eq!(failure.to_string(), "bucket name taken");
        assert_eq!(failure.messages(), vec!["bucket name taken"]);
    }

    #[test]
    fn test_many_errors_keep_order() {
        let failure = errors(&["first", "second", "third"]).into_result().unwrap_err();

        match &failure {
            RunFailure::Aggregate(inner) => assert_eq!(inner.len(), 3),
            other => panic!("unexpected failure: {other:?}"),
        }
        assert_eq!(failure.messages(), vec!["first", "second", "third"]);
        assert_eq!(
            failure.to_string(),
            "3 errors were reported: first; second; third"
        );
    }

    #[test]
    fn test_from_captured() {
        let urn = Urn::new("web", "dev", "t:index:T", "db");
        let captured = vec![CapturedError::new("boom", Some(urn.clone()))];

        let errors = RunErrors::from(captured);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.as_slice()[0].urn, Some(urn));
    }

    #[test]
    fn test_callback_failure_has_no_reported_errors() {
        let failure = RunFailure::Callback(anyhow::anyhow!("crashed"));

        assert!(failure.is_callback());
        assert!(failure.errors().is_empty());
        assert_eq!(failure.messages(), vec!["crashed"]);
    }
}
