use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PROJECT: &str = "project";
pub const DEFAULT_STACK: &str = "stack";

/// Settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    pub project: String,
    pub stack: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Preview only: providers are asked what would change, nothing is applied.
    #[serde(default)]
    pub dry_run: bool,
    /// Identifies the run in logs and lifecycle events.
    #[serde(default = "Uuid::new_v4")]
    pub run_id: Uuid,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            project: DEFAULT_PROJECT.to_string(),
            stack: DEFAULT_STACK.to_string(),
            organization: None,
            dry_run: false,
            run_id: Uuid::new_v4(),
        }
    }
}

impl RunOptions {
    pub fn new(project: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            stack: stack.into(),
            ..Default::default()
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    /// Name of the root resource that carries a free-function run's outputs.
    pub fn root_name(&self) -> String {
        format!("{}-{}", self.project, self.stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RunOptions::default();
        assert_eq!(options.project, "project");
        assert_eq!(options.stack, "stack");
        assert!(!options.dry_run);
        assert!(options.organization.is_none());
    }

    #[test]
    fn test_builder() {
        let id = Uuid::new_v4();
        let options = RunOptions::new("web", "prod")
            .with_organization("acme")
            .with_dry_run(true)
            .with_run_id(id);

        assert_eq!(options.project, "web");
        assert_eq!(options.stack, "prod");
        assert_eq!(options.organization.as_deref(), Some("acme"));
        assert!(options.dry_run);
        assert_eq!(options.run_id, id);
        assert_eq!(options.root_name(), "web-prod");
    }

    #[test]
    fn test_fresh_run_ids() {
        assert_ne!(RunOptions::default().run_id, RunOptions::default().run_id);
    }
}
