use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use stack_core::{
    InvokeRequest, LogEntry, PropertyMap, RegisterResourceRequest, RegisteredResource, Severity,
    Urn,
};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::traits::{Engine, ResourceMonitor};

const DEFAULT_MAX_RETRIES: u32 = 2;
const INITIAL_BACKOFF_MS: u64 = 200;

#[derive(Serialize)]
struct RegisterOutputsBody<'a> {
    urn: &'a Urn,
    outputs: PropertyMap,
}

#[derive(Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    outputs: PropertyMap,
}

/// Shared request plumbing for both clients.
#[derive(Clone)]
struct Backend {
    client: Client,
    base_url: String,
}

impl Backend {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            debug!(url = %url, attempt = retries + 1, "POST");
            let response = self.client.post(&url).json(body).send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            let text = response.text().await.unwrap_or_default();
            if status.is_server_error() && retries < DEFAULT_MAX_RETRIES {
                warn!(
                    url = %url,
                    status = status.as_u16(),
                    "server error, retrying in {}ms (attempt {}/{})",
                    backoff_ms,
                    retries + 1,
                    DEFAULT_MAX_RETRIES
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                retries += 1;
                backoff_ms *= 2;
                continue;
            }

            return Err(EngineError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.post(path, body).await?;
        Ok(response.json().await?)
    }
}

/// Resource monitor backed by a live deployment service.
#[derive(Clone)]
pub struct HttpMonitor {
    backend: Backend,
}

impl HttpMonitor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            backend: Backend::new(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.backend.base_url
    }
}

#[async_trait]
impl ResourceMonitor for HttpMonitor {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn register_resource(
        &self,
        request: RegisterResourceRequest,
    ) -> Result<RegisteredResource> {
        self.backend.post_json("/resources", &request).await
    }

    async fn register_outputs(&self, urn: &Urn, outputs: PropertyMap) -> Result<()> {
        self.backend
            .post("/resources/outputs", &RegisterOutputsBody { urn, outputs })
            .await?;
        Ok(())
    }

    async fn invoke(&self, request: InvokeRequest) -> Result<PropertyMap> {
        let response: InvokeResponse = self.backend.post_json("/invoke", &request).await?;
        Ok(response.outputs)
    }
}

/// Engine that ships diagnostics to a live deployment service.
#[derive(Clone)]
pub struct HttpEngine {
    backend: Backend,
}

impl HttpEngine {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            backend: Backend::new(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.backend.base_url
    }
}

#[async_trait]
impl Engine for HttpEngine {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn log(&self, severity: Severity, message: &str, urn: Option<&Urn>) -> Result<()> {
        let entry = LogEntry::new(severity, message, urn.cloned());
        self.backend.post("/logs", &entry).await?;
        Ok(())
    }
}
