//! Prism v4 task endpoint client.
//!
//! A [`PrismClient`] is an explicit handle built once from a [`PrismConfig`]
//! and passed to each operation that needs it; it is never a process-wide
//! singleton. It implements [`TaskStore`], so a [`crate::TaskWaiter`] can
//! poll a live Prism endpoint directly.

use std::time::Duration;

use async_trait::async_trait;
use error_stack::Report;
use error_stack::ResultExt;
use reqwest::Client;
use reqwest::StatusCode;
use tracing::debug;
use tracing::info;
use url::Url;

use crate::error::FetchError;
use crate::error::FetchResult;
use crate::types::ResponseData;
use crate::types::ResponseEnvelope;
use crate::types::TaskSnapshot;
use crate::types::TaskStore;

/// Connection parameters for a Prism endpoint.
#[derive(Debug, Clone)]
pub struct PrismConfig {
    /// Base URL of the Prism Central endpoint, e.g. `https://pc:9440`
    pub endpoint: String,
    /// Basic-auth user
    pub username: String,
    /// Basic-auth password
    pub password: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Skip TLS certificate verification (self-signed lab clusters)
    pub insecure: bool,
}

impl PrismConfig {
    /// Create a config with default timeout and TLS verification on.
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            request_timeout: Duration::from_secs(30),
            insecure: false,
        }
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Allow invalid TLS certificates.
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }
}

/// HTTP client for the Prism task resource.
pub struct PrismClient {
    config: PrismConfig,
    http: Client,
    base: Url,
}

impl PrismClient {
    /// Create a client from the given connection parameters.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Configuration`] when the endpoint URL is
    /// invalid or the HTTP client cannot be built.
    pub fn new(config: PrismConfig) -> FetchResult<Self> {
        let base = Url::parse(&config.endpoint).change_context(FetchError::Configuration {
            message: format!("invalid endpoint URL: {}", config.endpoint),
        })?;

        let http = Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.insecure)
            .build()
            .change_context(FetchError::Configuration {
                message: "failed to build HTTP client".into(),
            })?;

        info!(endpoint = %config.endpoint, "Prism client created");

        Ok(Self { config, http, base })
    }

    fn task_url(&self, task_id: &str) -> FetchResult<Url> {
        self.base
            .join(&format!("api/prism/v4.0/config/tasks/{task_id}"))
            .change_context(FetchError::Configuration {
                message: format!("cannot build task URL for {task_id}"),
            })
    }
}

#[async_trait]
impl TaskStore for PrismClient {
    async fn fetch_task(&self, task_id: &str) -> FetchResult<TaskSnapshot> {
        let url = self.task_url(task_id)?;

        let response = self
            .http
            .get(url.clone())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .change_context(FetchError::Network {
                message: format!("request to {url} failed"),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Report::new(FetchError::NotYetVisible {
                task_id: task_id.to_owned(),
            }));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Prism reports an unknown task identifier as a client error
            // before the task record becomes visible.
            if body.contains("INVALID_UUID") || body.contains("TASK_NOT_FOUND") {
                return Err(Report::new(FetchError::NotYetVisible {
                    task_id: task_id.to_owned(),
                }));
            }
            return Err(Report::new(FetchError::Http {
                status: status.as_u16(),
                message: body,
            }));
        }

        let envelope: ResponseEnvelope =
            response
                .json()
                .await
                .change_context(FetchError::Serialization {
                    message: format!("failed to decode task response for {task_id}"),
                })?;

        match envelope.data {
            ResponseData::Task(snapshot) => {
                debug!(task_id, status = %snapshot.status, "fetched task");
                Ok(snapshot)
            }
            ResponseData::TaskReference(_) => Err(Report::new(FetchError::Serialization {
                message: format!("expected a task entity for {task_id}, got a task reference"),
            })),
        }
    }
}
