use crate::api::RegistryApi;
use crate::error::{RegistryError, RegistryRetryPredicate, Result};
use crate::wire::{
    DeleteImageRequest, ListImagesRequest, ListImagesResponse, ListProjectsRequest,
    ListProjectsResponse,
};
use async_trait::async_trait;
use regprune_core::retry::{RetryExecutor, RetryExecutorBuilder, TracingObserver};
use regprune_core::types::{Image, Page, PageRequest, Project, RetryPolicy};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

const PROJECT_SERVICE: &str = "depot.core.v1.ProjectService";
const REGISTRY_SERVICE: &str = "depot.build.v1.RegistryService";

/// Client for the Depot project and registry services
///
/// Requests are JSON-encoded Connect RPC calls (`POST <base>/<service>/<method>`)
/// authenticated with a bearer token. Transient failures are retried
/// according to the configured `RetryPolicy`.
pub struct DepotClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    retry_policy: RetryPolicy,
}

impl DepotClient {
    /// Create a new client for the API at `base_url`
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, token, Duration::from_secs(30))
    }

    /// Create a new client with a per-request timeout
    pub fn with_timeout(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "connect-protocol-version",
            HeaderValue::from_static("1"),
        );

        let client = reqwest::Client::builder()
            .user_agent(concat!("regprune/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            retry_policy: RetryPolicy::default(),
        })
    }

    /// Set the retry policy applied to every call
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn executor(&self, operation: &str) -> RetryExecutor<RegistryRetryPredicate, TracingObserver> {
        RetryExecutorBuilder::new()
            .with_policy(self.retry_policy.clone())
            .with_predicate(RegistryRetryPredicate::default())
            .with_observer(TracingObserver::new(operation))
            .build()
    }

    /// Invoke `<service>/<method>` with retries and decode the response
    async fn call<Req, Resp>(&self, service: &str, method: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}/{}", self.base_url, service, method);
        self.executor(method)
            .execute(|| self.send_once(method, &url, body))
            .await
            .map_err(|e| e.into_inner())
    }

    async fn send_once<Req, Resp>(&self, method: &str, url: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        trace!(status = status.as_u16(), "Response body: {}", text);

        if !status.is_success() {
            let (code, message) = parse_error_body(&text);
            return Err(RegistryError::api(method, status.as_u16(), code, message));
        }

        let text = if text.trim().is_empty() { "{}" } else { &text };
        serde_json::from_str(text)
            .map_err(|e| RegistryError::invalid_response(method, e.to_string()))
    }
}

#[async_trait]
impl RegistryApi for DepotClient {
    async fn list_projects(&self, request: PageRequest) -> Result<Page<Project>> {
        let body = ListProjectsRequest {
            page_size: request.page_size,
            page_token: request.page_token.as_deref(),
        };
        let response: ListProjectsResponse =
            self.call(PROJECT_SERVICE, "ListProjects", &body).await?;
        Ok(response.into_page())
    }

    async fn list_images(&self, project_id: &str, request: PageRequest) -> Result<Page<Image>> {
        let body = ListImagesRequest {
            project_id,
            page_size: request.page_size,
            page_token: request.page_token.as_deref(),
        };
        let response: ListImagesResponse = self.call(REGISTRY_SERVICE, "ListImages", &body).await?;
        Ok(response.into_page())
    }

    async fn delete_images(&self, project_id: &str, image_tags: &[String]) -> Result<()> {
        let body = DeleteImageRequest {
            project_id,
            image_tags,
        };
        let _: serde_json::Value = self.call(REGISTRY_SERVICE, "DeleteImage", &body).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ConnectError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Extract the Connect error code and message from a failure body
fn parse_error_body(text: &str) -> (Option<String>, String) {
    match serde_json::from_str::<ConnectError>(text) {
        Ok(err) => {
            let message = err
                .message
                .or_else(|| err.code.clone())
                .unwrap_or_else(|| "(no error message)".to_string());
            (err.code, message)
        }
        Err(_) if text.trim().is_empty() => (None, "(no response body)".to_string()),
        Err(_) => (None, text.trim().to_string()),
    }
}
