use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::resource::Urn;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// A diagnostic as delivered to an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urn: Option<Urn>,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(severity: Severity, message: impl Into<String>, urn: Option<Urn>) -> Self {
        Self {
            severity,
            message: message.into(),
            urn,
            timestamp: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// An error-severity diagnostic recorded by an in-memory engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urn: Option<Urn>,
    pub reported_at: DateTime<Utc>,
}

impl CapturedError {
    pub fn new(message: impl Into<String>, urn: Option<Urn>) -> Self {
        Self {
            message: message.into(),
            urn,
            reported_at: Utc::now(),
        }
    }
}

impl From<LogEntry> for CapturedError {
    fn from(entry: LogEntry) -> Self {
        Self {
            message: entry.message,
            urn: entry.urn,
            reported_at: entry.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parsing() {
        assert_eq!(Severity::parse("warning"), Some(Severity::Warning));
        assert_eq!(Severity::parse("error"), Some(Severity::Error));
        assert_eq!(Severity::parse("fatal"), None);
        assert_eq!(Severity::Info.as_str(), "info");
    }

    #[test]
    fn test_severity_serialization() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }

    #[test]
    fn test_captured_error_from_entry() {
        let urn = Urn::new("p", "s", "t:index:T", "n");
        let entry = LogEntry::new(Severity::Error, "boom", Some(urn.clone()));
        assert!(entry.is_error());

        let captured = CapturedError::from(entry.clone());
        assert_eq!(captured.message, "boom");
        assert_eq!(captured.urn, Some(urn));
        assert_eq!(captured.reported_at, entry.timestamp);
    }
}
