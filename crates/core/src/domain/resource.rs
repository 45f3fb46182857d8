use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CoreError, Result};

/// String-keyed property bag used for resource inputs, outputs and stack outputs.
pub type PropertyMap = BTreeMap<String, serde_json::Value>;

/// Type token of the internal resource that stands in for a free-function
/// callback. It is stripped from every reported resource list.
pub const STACK_WRAPPER_TYPE: &str = "stackrun:internal:StackWrapper";

const URN_PREFIX: &str = "urn:stackrun:";

/// Unique resource name: `urn:stackrun:{stack}::{project}::{type}::{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Urn(String);

impl Urn {
    pub fn new(project: &str, stack: &str, type_token: &str, name: &str) -> Self {
        Self(format!(
            "{URN_PREFIX}{stack}::{project}::{type_token}::{name}"
        ))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix(URN_PREFIX)
            .ok_or_else(|| CoreError::InvalidUrn(s.to_string()))?;

        let parts: Vec<&str> = rest.splitn(4, "::").collect();
        if parts.len() != 4 || parts.iter().any(|p| p.is_empty()) {
            return Err(CoreError::InvalidUrn(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn part(&self, index: usize) -> &str {
        self.0
            .strip_prefix(URN_PREFIX)
            .and_then(|rest| rest.splitn(4, "::").nth(index))
            .unwrap_or_default()
    }

    pub fn stack(&self) -> &str {
        self.part(0)
    }

    pub fn project(&self) -> &str {
        self.part(1)
    }

    pub fn type_token(&self) -> &str {
        self.part(2)
    }

    pub fn name(&self) -> &str {
        self.part(3)
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resource registration as sent to a resource monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterResourceRequest {
    pub type_token: String,
    pub name: String,
    #[serde(default)]
    pub inputs: PropertyMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Urn>,
    /// Custom resources are managed by a provider; components only group children.
    #[serde(default = "default_custom")]
    pub custom: bool,
}

fn default_custom() -> bool {
    true
}

impl RegisterResourceRequest {
    pub fn new(type_token: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_token: type_token.into(),
            name: name.into(),
            inputs: PropertyMap::new(),
            provider: None,
            parent: None,
            custom: true,
        }
    }

    /// A component resource: registered for grouping, never sent to a provider.
    pub fn component(type_token: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            custom: false,
            ..Self::new(type_token, name)
        }
    }

    pub fn with_inputs(mut self, inputs: PropertyMap) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.inputs.insert(key.into(), value);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_parent(mut self, parent: Urn) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn is_stack_wrapper(&self) -> bool {
        self.type_token == STACK_WRAPPER_TYPE
    }

    /// Reject requests that cannot form a URN.
    pub fn validate(&self) -> Result<()> {
        if self.type_token.is_empty() {
            return Err(CoreError::Validation(format!(
                "resource {:?} has an empty type",
                self.name
            )));
        }
        if self.name.is_empty() {
            return Err(CoreError::Validation(format!(
                "resource of type {} has an empty name",
                self.type_token
            )));
        }
        if self.type_token.contains("::") {
            return Err(CoreError::Validation(format!(
                "resource type {} must not contain '::'",
                self.type_token
            )));
        }
        Ok(())
    }
}

/// What the monitor answers for a registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredResource {
    pub urn: Urn,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub outputs: PropertyMap,
}

/// A provider function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub token: String,
    #[serde(default)]
    pub args: PropertyMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl InvokeRequest {
    pub fn new(token: impl Into<String>, args: PropertyMap) -> Self {
        Self {
            token: token.into(),
            args,
            provider: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_urn_parts() {
        let urn = Urn::new("web", "dev", "aws:s3/bucket:Bucket", "assets");

        assert_eq!(
            urn.as_str(),
            "urn:stackrun:dev::web::aws:s3/bucket:Bucket::assets"
        );
        assert_eq!(urn.stack(), "dev");
        assert_eq!(urn.project(), "web");
        assert_eq!(urn.type_token(), "aws:s3/bucket:Bucket");
        assert_eq!(urn.name(), "assets");
    }

    #[test]
    fn test_urn_parse() {
        let urn = Urn::new("web", "dev", "random:index:Id", "suffix");
        assert_eq!(Urn::parse(urn.as_str()).unwrap(), urn);

        assert!(Urn::parse("urn:other:dev::web::t::n").is_err());
        assert!(Urn::parse("urn:stackrun:dev::web::t").is_err());
        assert!(Urn::parse("urn:stackrun:dev::::t::n").is_err());
    }

    #[test]
    fn test_urn_serializes_as_string() {
        let urn = Urn::new("p", "s", "t:index:T", "n");
        let json = serde_json::to_string(&urn).unwrap();
        assert_eq!(json, "\"urn:stackrun:s::p::t:index:T::n\"");
    }

    #[test]
    fn test_register_request_builder() {
        let request = RegisterResourceRequest::new("aws:s3/bucket:Bucket", "assets")
            .with_input("acl", json!("private"))
            .with_provider("aws-default");

        assert!(request.custom);
        assert!(!request.is_stack_wrapper());
        assert_eq!(request.inputs.get("acl"), Some(&json!("private")));
        assert_eq!(request.provider.as_deref(), Some("aws-default"));

        let component = RegisterResourceRequest::component(STACK_WRAPPER_TYPE, "root");
        assert!(!component.custom);
        assert!(component.is_stack_wrapper());
    }

    #[test]
    fn test_register_request_inputs_and_parent() {
        let parent = Urn::new("web", "dev", "t:index:Group", "group");
        let inputs = PropertyMap::from([("size".to_string(), json!(3))]);

        let request = RegisterResourceRequest::new("t:index:T", "child")
            .with_inputs(inputs.clone())
            .with_parent(parent.clone());

        assert_eq!(request.inputs, inputs);
        assert_eq!(request.parent, Some(parent));
    }

    #[test]
    fn test_register_request_validation() {
        assert!(RegisterResourceRequest::new("t:index:T", "n").validate().is_ok());
        assert!(RegisterResourceRequest::new("", "n").validate().is_err());
        assert!(RegisterResourceRequest::new("t:index:T", "").validate().is_err());

        let err = RegisterResourceRequest::new("a::b", "n").validate().unwrap_err();
        assert_eq!(
            err,
            CoreError::Validation("resource type a::b must not contain '::'".to_string())
        );
    }

    #[test]
    fn test_register_request_defaults_on_deserialize() {
        let request: RegisterResourceRequest =
            serde_json::from_value(json!({ "type_token": "t:index:T", "name": "n" })).unwrap();

        assert!(request.custom);
        assert!(request.inputs.is_empty());
        assert!(request.parent.is_none());
    }
}
