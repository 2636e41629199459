//! HTTP transport boundary
//!
//! The dispatcher talks to the network through [`Transport`]. A transport
//! either returns the HTTP response it got, whatever the status, or a
//! [`TransportError`] when no response was obtained at all. Interpreting the
//! status and body is the dispatcher's job.

use crate::config::{ClientConfig, ConfigError};
use crate::request::Method;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::future::Future;
use thiserror::Error;

/// Fully resolved request handed to a transport
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Headers, in send order
    pub headers: Vec<(String, String)>,
    /// Serialized JSON body; `None` means no body at all
    pub body: Option<String>,
}

impl TransportRequest {
    /// Value of the first header matching `name`, ignoring case
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Any HTTP response, successful or not
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    /// Status code
    pub status: u16,
    /// Reason phrase
    ///
    /// `ReqwestTransport` fills this with the canonical phrase for the status
    /// code, not the phrase the server sent. Codes without a canonical phrase
    /// (for example 599) get an empty string, so a failure without a body
    /// message normalizes to the unknown-error message.
    pub status_text: String,
    /// Body as text
    pub body: String,
}

impl RawResponse {
    /// Whether the status is 2xx
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// No HTTP response was obtained
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("transport failed: {message}")]
pub struct TransportError {
    /// Description from the underlying client
    pub message: String,
}

impl TransportError {
    /// Create a transport error
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of one transport call
pub type TransportResult = Result<RawResponse, TransportError>;

/// Sends requests over the network
///
/// # Implementation Notes
///
/// - Must not retry.
/// - Timeouts, if any, are reported as [`TransportError`].
pub trait Transport: Send + Sync {
    /// Send one request and wait for the response
    fn send(&self, request: TransportRequest) -> impl Future<Output = TransportResult> + Send;
}

/// Production transport backed by `reqwest`
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport from client configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the configuration is invalid, or
    /// `ConfigError::Transport` if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ConfigError::Transport(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an existing `reqwest` client
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    const fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::with_client(Client::new())
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: TransportRequest) -> impl Future<Output = TransportResult> + Send {
        let client = self.client.clone();

        async move {
            let mut builder = client
                .request(Self::method(request.method), &request.url)
                .header(ACCEPT, "application/json");

            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }

            if let Some(body) = request.body {
                builder = builder.header(CONTENT_TYPE, "application/json").body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| TransportError::new(e.to_string()))?;

            let status = response.status();
            let status_text = status.canonical_reason().unwrap_or_default().to_string();
            let body = response
                .text()
                .await
                .map_err(|e| TransportError::new(format!("failed to read response body: {e}")))?;

            Ok(RawResponse {
                status: status.as_u16(),
                status_text,
                body,
            })
        }
    }
}
