//! Event types for run lifecycle notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stack_core::{Severity, Urn};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// All possible events in a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The runner started driving a callback
    #[serde(rename = "run.started")]
    RunStarted {
        run_id: Uuid,
        project: String,
        stack: String,
        dry_run: bool,
    },

    /// A resource registration was acknowledged by the monitor
    #[serde(rename = "resource.registered")]
    ResourceRegistered {
        run_id: Uuid,
        urn: Urn,
        type_token: String,
    },

    /// A diagnostic was sent to the engine
    #[serde(rename = "diagnostic.reported")]
    DiagnosticReported {
        run_id: Uuid,
        severity: Severity,
        message: String,
        urn: Option<Urn>,
    },

    /// The run completed, successfully or not
    #[serde(rename = "run.finished")]
    RunFinished { run_id: Uuid, exit_code: i32 },
}

impl Event {
    /// Get the run ID associated with this event
    pub fn run_id(&self) -> Uuid {
        match self {
            Event::RunStarted { run_id, .. } => *run_id,
            Event::ResourceRegistered { run_id, .. } => *run_id,
            Event::DiagnosticReported { run_id, .. } => *run_id,
            Event::RunFinished { run_id, .. } => *run_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_envelope_creation() {
        let event = Event::RunFinished {
            run_id: Uuid::new_v4(),
            exit_code: 0,
        };
        let envelope = EventEnvelope::new(event);

        assert!(!envelope.id.is_nil());
        assert!(envelope.timestamp <= Utc::now());
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::ResourceRegistered {
            run_id: Uuid::new_v4(),
            urn: Urn::new("web", "dev", "aws:s3/bucket:Bucket", "assets"),
            type_token: "aws:s3/bucket:Bucket".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("resource.registered"));
        assert!(json.contains("urn:stackrun:dev::web::aws:s3/bucket:Bucket::assets"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"run.finished","run_id":"550e8400-e29b-41d4-a716-446655440000","exit_code":32}"#;
        let event: Event = serde_json::from_str(json).unwrap();

        match event {
            Event::RunFinished { run_id, exit_code } => {
                assert_eq!(exit_code, 32);
                assert!(!run_id.is_nil());
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn test_event_run_id() {
        let run_id = Uuid::new_v4();

        let event = Event::DiagnosticReported {
            run_id,
            severity: Severity::Warning,
            message: "deprecated".to_string(),
            urn: None,
        };
        assert_eq!(event.run_id(), run_id);
    }
}
