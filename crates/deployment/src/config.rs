use engine::{HttpEngine, HttpMonitor};
use serde::{Deserialize, Serialize};
use stack_core::{RunOptions, DEFAULT_PROJECT, DEFAULT_STACK};
use tracing::{debug, warn};

use crate::error::{DeploymentError, Result};

pub const ENV_PROJECT: &str = "STACKRUN_PROJECT";
pub const ENV_STACK: &str = "STACKRUN_STACK";
pub const ENV_ORGANIZATION: &str = "STACKRUN_ORGANIZATION";
pub const ENV_DRY_RUN: &str = "STACKRUN_DRY_RUN";
pub const ENV_MONITOR: &str = "STACKRUN_MONITOR";
pub const ENV_ENGINE: &str = "STACKRUN_ENGINE";

/// Settings for a live run, as handed over by the launching process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
    /// Base URL of the resource monitor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor_url: Option<String>,
    /// Base URL of the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_url: Option<String>,
}

impl DeploymentConfig {
    /// Read config from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read config through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let dry_run = match get(ENV_DRY_RUN) {
            Some(value) => parse_flag(&value).ok_or_else(|| {
                DeploymentError::config(format!("{ENV_DRY_RUN} must be a boolean, got {value:?}"))
            })?,
            None => false,
        };

        let config = Self {
            project: get(ENV_PROJECT),
            stack: get(ENV_STACK),
            organization: get(ENV_ORGANIZATION),
            dry_run,
            monitor_url: get(ENV_MONITOR),
            engine_url: get(ENV_ENGINE),
        };

        debug!(
            project = ?config.project,
            stack = ?config.stack,
            dry_run = config.dry_run,
            "Deployment config loaded"
        );
        Ok(config)
    }

    pub fn to_run_options(&self) -> RunOptions {
        let project = self.project.clone().unwrap_or_else(|| {
            warn!("{} is not set, using {:?}", ENV_PROJECT, DEFAULT_PROJECT);
            DEFAULT_PROJECT.to_string()
        });
        let stack = self.stack.clone().unwrap_or_else(|| {
            warn!("{} is not set, using {:?}", ENV_STACK, DEFAULT_STACK);
            DEFAULT_STACK.to_string()
        });

        let mut options = RunOptions::new(project, stack).with_dry_run(self.dry_run);
        if let Some(organization) = &self.organization {
            options = options.with_organization(organization.clone());
        }
        options
    }

    pub fn monitor(&self) -> Result<HttpMonitor> {
        self.monitor_url
            .as_deref()
            .map(HttpMonitor::new)
            .ok_or_else(|| DeploymentError::config(format!("{ENV_MONITOR} is not set")))
    }

    pub fn engine(&self) -> Result<HttpEngine> {
        self.engine_url
            .as_deref()
            .map(HttpEngine::new)
            .ok_or_else(|| DeploymentError::config(format!("{ENV_ENGINE} is not set")))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = DeploymentConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, DeploymentConfig::default());

        let options = config.to_run_options();
        assert_eq!(options.project, "project");
        assert_eq!(options.stack, "stack");
        assert!(!options.dry_run);
    }

    #[test]
    fn test_config_full() {
        let config = DeploymentConfig::from_lookup(lookup(&[
            (ENV_PROJECT, "web"),
            (ENV_STACK, "prod"),
            (ENV_ORGANIZATION, "acme"),
            (ENV_DRY_RUN, "TRUE"),
            (ENV_MONITOR, "http://127.0.0.1:9000"),
            (ENV_ENGINE, "http://127.0.0.1:9001/"),
        ]))
        .unwrap();

        let options = config.to_run_options();
        assert_eq!(options.project, "web");
        assert_eq!(options.stack, "prod");
        assert_eq!(options.organization.as_deref(), Some("acme"));
        assert!(options.dry_run);

        assert_eq!(config.monitor().unwrap().base_url(), "http://127.0.0.1:9000");
        assert_eq!(config.engine().unwrap().base_url(), "http://127.0.0.1:9001");
    }

    #[test]
    fn test_config_blank_values_ignored() {
        let config = DeploymentConfig::from_lookup(lookup(&[(ENV_PROJECT, "  ")])).unwrap();
        assert!(config.project.is_none());
    }

    #[test]
    fn test_config_bad_dry_run() {
        let err = DeploymentConfig::from_lookup(lookup(&[(ENV_DRY_RUN, "maybe")])).unwrap_err();
        assert!(matches!(err, DeploymentError::Config(_)));
    }

    #[test]
    fn test_config_missing_endpoints() {
        let config = DeploymentConfig::default();
        assert!(matches!(config.monitor(), Err(DeploymentError::Config(_))));
        assert!(matches!(config.engine(), Err(DeploymentError::Config(_))));
    }
}
