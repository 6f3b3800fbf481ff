//! Transport between the link form and the apply service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::api::dto::links::{LinkResponse, ReconcileRequest};
use crate::application::services::LinkService;
use crate::domain::entities::LinkEntry;
use crate::domain::validation::ValidationError;
use crate::error::{AppError, INTERNAL_ERROR_MESSAGE};

/// Default request timeout for [`HttpLinkGateway`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure talking to the apply service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request did not complete (timeout, refused connection).
    #[error("Network error: {message}")]
    Network { message: String, retryable: bool },

    /// The service refused the request; resubmitting it unchanged fails again.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Returns true if resubmitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { retryable, .. } => *retryable,
            Self::Server { .. } => true,
            Self::Rejected { .. } | Self::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Self::Decode(e.to_string());
        }

        Self::Network {
            message: e.to_string(),
            retryable: e.is_timeout() || e.is_connect(),
        }
    }
}

impl From<AppError> for GatewayError {
    fn from(e: AppError) -> Self {
        let status = e.status().as_u16();

        match e {
            AppError::Validation { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Conflict { message, .. } => Self::Rejected { status, message },
            AppError::Unavailable { message, .. } => Self::Server { status, message },
            AppError::Internal { .. } => Self::Server {
                status,
                message: INTERNAL_ERROR_MESSAGE.to_string(),
            },
        }
    }
}

impl From<ValidationError> for GatewayError {
    fn from(e: ValidationError) -> Self {
        Self::Rejected {
            status: StatusCode::BAD_REQUEST.as_u16(),
            message: e.to_string(),
        }
    }
}

/// Reads and writes an owner's links.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkGateway: Send + Sync {
    /// Fetches the owner's canonical list.
    async fn fetch_links(&self, owner_id: &str) -> Result<Vec<LinkEntry>, GatewayError>;

    /// Sends one reconciliation request and returns the canonical records it touched.
    async fn apply(&self, request: &ReconcileRequest) -> Result<Vec<LinkEntry>, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// [`LinkGateway`] over the HTTP API.
#[derive(Debug, Clone)]
pub struct HttpLinkGateway {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpLinkGateway {
    /// Creates a gateway for the service at `base_url` (e.g. `http://localhost:3000`).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Network`] if `base_url` is not an absolute URL
    /// or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url).map_err(|e| GatewayError::Network {
            message: format!("Invalid base URL '{}': {}", base_url, e),
            retryable: false,
        })?;

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();

        url.path_segments_mut()
            .map_err(|_| GatewayError::Network {
                message: format!("Base URL '{}' cannot have a path", self.base_url),
                retryable: false,
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }
}

#[async_trait]
impl LinkGateway for HttpLinkGateway {
    async fn fetch_links(&self, owner_id: &str) -> Result<Vec<LinkEntry>, GatewayError> {
        let url = self.endpoint(&["api", "links", owner_id])?;
        tracing::debug!(%url, "Fetching links");

        let response = self.client.get(url).send().await?;
        read_links(response).await
    }

    async fn apply(&self, request: &ReconcileRequest) -> Result<Vec<LinkEntry>, GatewayError> {
        let url = self.endpoint(&["api", "links", "new"])?;
        tracing::debug!(
            %url,
            links = request.links.len(),
            removals = request.links_to_remove.len(),
            "Submitting link batch"
        );

        let response = self.client.post(url).json(request).send().await?;
        read_links(response).await
    }
}

/// Decodes a link list, or maps the error body to a [`GatewayError`].
async fn read_links(response: reqwest::Response) -> Result<Vec<LinkEntry>, GatewayError> {
    let status = response.status();

    if status.is_success() {
        let links: Vec<LinkResponse> = response.json().await?;
        return Ok(links.into_iter().map(LinkEntry::from).collect());
    }

    let message = match response.json::<ErrorMessage>().await {
        Ok(body) => body.message,
        Err(_) => status.canonical_reason().unwrap_or("Unknown error").to_string(),
    };

    if status.is_server_error() {
        Err(GatewayError::Server {
            status: status.as_u16(),
            message,
        })
    } else {
        Err(GatewayError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// [`LinkGateway`] calling a [`LinkService`] in process.
#[derive(Debug, Clone)]
pub struct LocalLinkGateway {
    service: Arc<LinkService>,
}

impl LocalLinkGateway {
    pub fn new(service: Arc<LinkService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl LinkGateway for LocalLinkGateway {
    async fn fetch_links(&self, owner_id: &str) -> Result<Vec<LinkEntry>, GatewayError> {
        let records = self.service.list_links(owner_id).await?;
        Ok(records.into_iter().map(LinkEntry::from).collect())
    }

    async fn apply(&self, request: &ReconcileRequest) -> Result<Vec<LinkEntry>, GatewayError> {
        let entries = request.entries()?;

        let records = self
            .service
            .apply(&request.user_id, entries, request.links_to_remove.clone())
            .await?;

        Ok(records.into_iter().map(LinkEntry::from).collect())
    }
}
