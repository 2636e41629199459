//! Request dispatch
//!
//! The dispatcher turns a [`RequestDescriptor`] into a transport call and
//! the transport's answer into an [`Outcome`]. It reads the session to add
//! `Authorization` but never writes to it, and it never refuses a call:
//! checking that the user is signed in is the caller's job.

use crate::normalize::{normalize, FailureDetails, Outcome, ResponseBody};
use crate::request::RequestDescriptor;
use crate::session::Session;
use crate::transport::{RawResponse, Transport, TransportRequest};
use serde_json::Value;

/// Name of the credential header
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Issues requests against one API origin
#[derive(Clone, Debug)]
pub struct Dispatcher<T> {
    transport: T,
    base_url: String,
    session: Session,
}

impl<T: Transport> Dispatcher<T> {
    /// Create a dispatcher
    ///
    /// `base_url` is the API origin; a trailing slash is ignored.
    #[must_use]
    pub fn new(transport: T, base_url: impl Into<String>, session: Session) -> Self {
        let base_url: String = base_url.into();
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    /// The session this dispatcher reads credentials from
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// The underlying transport
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// API origin
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request and normalize whatever comes back
    ///
    /// Always resolves; transport errors, non-2xx responses and unreadable
    /// success bodies all come back as [`Outcome::Failure`].
    #[tracing::instrument(
        name = "dispatch",
        skip(self, descriptor),
        fields(method = %descriptor.method(), path = %descriptor.path())
    )]
    pub async fn dispatch(&self, descriptor: &RequestDescriptor) -> Outcome {
        let request = self.build_request(descriptor);

        let outcome = match self.transport.send(request).await {
            Ok(response) => Self::interpret(response),
            Err(error) => {
                tracing::warn!(error = %error.message, "no response from server");
                Outcome::Failure(normalize(FailureDetails::no_response(error.message)))
            }
        };

        match &outcome {
            Outcome::Success { .. } => tracing::debug!("request succeeded"),
            Outcome::Failure(failure) => tracing::warn!(
                status = failure.http_status(),
                reason = failure.message(),
                "request failed"
            ),
        }

        outcome
    }

    /// Resolve the descriptor against the origin and the current session
    fn build_request(&self, descriptor: &RequestDescriptor) -> TransportRequest {
        let authorization = self.session.current_authorization_header_value();

        let mut headers: Vec<(String, String)> = descriptor
            .extra_headers()
            .iter()
            .filter(|(name, _)| {
                // The session credential wins over a caller-supplied one
                authorization.is_none() || !name.eq_ignore_ascii_case(AUTHORIZATION_HEADER)
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        if let Some(value) = authorization {
            headers.push((AUTHORIZATION_HEADER.to_string(), value));
        }

        TransportRequest {
            method: descriptor.method(),
            url: self.url_for(descriptor.path()),
            headers,
            body: descriptor.body().map(Value::to_string),
        }
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    fn interpret(response: RawResponse) -> Outcome {
        if !response.is_success() {
            let body = ResponseBody::parse(&response.body);
            return Outcome::Failure(normalize(FailureDetails::http(
                response.status,
                response.status_text,
                body,
            )));
        }

        if response.body.trim().is_empty() {
            return Outcome::Success {
                payload: Value::Null,
            };
        }

        match serde_json::from_str(&response.body) {
            Ok(payload) => Outcome::Success { payload },
            Err(e) => Outcome::Failure(normalize(
                FailureDetails::http(
                    response.status,
                    response.status_text,
                    ResponseBody::Text(response.body),
                )
                .with_cause(format!("malformed response body: {e}")),
            )),
        }
    }
}
