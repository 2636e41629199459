//! Outcome normalization
//!
//! Every dispatch ends in exactly one [`Outcome`]. Failures of any origin
//! (no response, non-2xx status, unreadable success body) are folded into
//! the single [`Failure`] shape so callers only ever match on two cases.
//!
//! # Message resolution
//!
//! 1. A string `message` field in a JSON body.
//! 2. The transport's status text.
//! 3. [`UNKNOWN_ERROR_MESSAGE`].

use crate::api::ApiErrorBody;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Message used when neither the body nor the status text says anything
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error.";

/// Status code recorded when no HTTP response was obtained
pub const NO_RESPONSE_STATUS: u16 = 0;

/// Response body as received
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    /// Nothing (or only whitespace) was received
    Empty,
    /// Body parsed as JSON
    Json(Value),
    /// Body that is not JSON, kept verbatim
    Text(String),
}

impl ResponseBody {
    /// Classify a raw body
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::Empty;
        }
        serde_json::from_str(raw).map_or_else(|_| Self::Text(raw.to_string()), Self::Json)
    }

    /// JSON body, if the body parsed as JSON
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Empty | Self::Text(_) => None,
        }
    }

    fn message(&self) -> Option<&str> {
        self.as_json()?
            .get("message")?
            .as_str()
            .filter(|message| !message.is_empty())
    }
}

/// Raw failure information gathered by the dispatcher
#[derive(Clone, Debug, PartialEq)]
pub struct FailureDetails {
    /// HTTP status, or [`NO_RESPONSE_STATUS`]
    pub status: u16,
    /// Reason phrase, empty when there was no response
    pub status_text: String,
    /// Body, unmodified
    pub body: ResponseBody,
    /// Transport-level description, when no response was obtained
    pub cause: Option<String>,
}

impl FailureDetails {
    /// Failure with an HTTP response
    #[must_use]
    pub fn http(status: u16, status_text: impl Into<String>, body: ResponseBody) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body,
            cause: None,
        }
    }

    /// Failure without any HTTP response
    #[must_use]
    pub fn no_response(cause: impl Into<String>) -> Self {
        Self {
            status: NO_RESPONSE_STATUS,
            status_text: String::new(),
            body: ResponseBody::Empty,
            cause: Some(cause.into()),
        }
    }

    /// Builder: attach a diagnostic cause
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

/// Failure classes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// No HTTP response was obtained
    Transport,
    /// An HTTP response was obtained but the call did not succeed
    Api,
}

/// Normalized failure descriptor
#[derive(Clone, Debug, PartialEq)]
pub struct Failure {
    http_status: u16,
    status_text: String,
    message: String,
    raw_body: ResponseBody,
    cause: Option<String>,
}

impl Failure {
    /// Failure class
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        if self.http_status == NO_RESPONSE_STATUS {
            FailureKind::Transport
        } else {
            FailureKind::Api
        }
    }

    /// HTTP status, `0` when no response was obtained
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.http_status
    }

    /// Reason phrase as reported by the transport
    #[must_use]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Human-readable message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Body as received
    #[must_use]
    pub const fn raw_body(&self) -> &ResponseBody {
        &self.raw_body
    }

    /// Transport-level description, for diagnostics only
    #[must_use]
    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    /// Whether the server rejected the credential (reactive expiry)
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.http_status == 401
    }

    /// The server's error envelope, when the body has that shape
    #[must_use]
    pub fn api_error(&self) -> Option<ApiErrorBody> {
        self.raw_body
            .as_json()
            .and_then(|value| ApiErrorBody::deserialize(value).ok())
    }

    /// Machine-readable error code, e.g. `VALIDATION_ERROR`
    #[must_use]
    pub fn error_code(&self) -> Option<String> {
        self.api_error().and_then(|body| body.code)
    }

    /// Per-field validation details
    #[must_use]
    pub fn details(&self) -> Vec<String> {
        self.api_error().map(|body| body.details).unwrap_or_default()
    }

    /// Summary line such as `POST /api/v1/orders -> 400 Bad Request`
    #[must_use]
    pub fn status_line(&self, method: &str, path: &str) -> String {
        let summary = format!("{method} {path}");
        let summary = summary.trim();
        let status = format!("{} {}", self.http_status, self.status_text);
        if summary.is_empty() {
            status.trim_end().to_string()
        } else {
            format!("{summary} -> {}", status.trim_end())
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            FailureKind::Transport => write!(f, "network error: {}", self.message),
            FailureKind::Api if self.status_text.is_empty() => {
                write!(f, "HTTP {}: {}", self.http_status, self.message)
            }
            FailureKind::Api => write!(
                f,
                "HTTP {} {}: {}",
                self.http_status, self.status_text, self.message
            ),
        }
    }
}

impl std::error::Error for Failure {}

/// Turn raw failure information into a [`Failure`]
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use storefront_client::normalize::{normalize, FailureDetails, ResponseBody};
///
/// let failure = normalize(FailureDetails::http(
///     400,
///     "Bad Request",
///     ResponseBody::Json(json!({"message": "Insufficient stock"})),
/// ));
///
/// assert_eq!(failure.http_status(), 400);
/// assert_eq!(failure.message(), "Insufficient stock");
/// ```
#[must_use]
pub fn normalize(details: FailureDetails) -> Failure {
    let message = details
        .body
        .message()
        .or_else(|| Some(details.status_text.as_str()).filter(|text| !text.is_empty()))
        .unwrap_or(UNKNOWN_ERROR_MESSAGE)
        .to_string();

    Failure {
        http_status: details.status,
        status_text: details.status_text,
        message,
        raw_body: details.body,
        cause: details.cause,
    }
}

/// Result of one dispatch
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// 2xx response with a readable JSON body
    Success {
        /// Parsed body; `Null` for an empty body
        payload: Value,
    },
    /// Anything else
    Failure(Failure),
}

impl Outcome {
    /// Whether this is a success
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The success payload
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success { payload } => Some(payload),
            Self::Failure(_) => None,
        }
    }

    /// The failure
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    /// Convert into a `Result`
    ///
    /// # Errors
    ///
    /// Returns the [`Failure`] when the outcome was not a success.
    pub fn into_result(self) -> Result<Value, Failure> {
        match self {
            Self::Success { payload } => Ok(payload),
            Self::Failure(failure) => Err(failure),
        }
    }

    /// Decode the success payload into `T`
    ///
    /// # Errors
    ///
    /// Returns `Err(Ok(failure))` for a failed outcome and `Err(Err(e))` when
    /// the payload does not decode.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, Result<Failure, serde_json::Error>> {
        let payload = self.into_result().map_err(Ok)?;
        serde_json::from_value(payload).map_err(Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_from_json_body() {
        let failure = normalize(FailureDetails::http(
            400,
            "Bad Request",
            ResponseBody::Json(json!({"message": "Insufficient stock"})),
        ));

        assert_eq!(failure.http_status(), 400);
        assert_eq!(failure.status_text(), "Bad Request");
        assert_eq!(failure.message(), "Insufficient stock");
        assert_eq!(failure.kind(), FailureKind::Api);
    }

    #[test]
    fn test_message_falls_back_to_status_text() {
        let failure = normalize(FailureDetails::http(
            502,
            "Bad Gateway",
            ResponseBody::parse("<html>upstream down</html>"),
        ));

        assert_eq!(failure.message(), "Bad Gateway");
        assert_eq!(
            failure.raw_body(),
            &ResponseBody::Text("<html>upstream down</html>".to_string())
        );
    }

    #[test]
    fn test_json_without_message_falls_back_to_status_text() {
        let failure = normalize(FailureDetails::http(
            500,
            "Internal Server Error",
            ResponseBody::Json(json!({"error": "boom"})),
        ));
        assert_eq!(failure.message(), "Internal Server Error");

        let failure = normalize(FailureDetails::http(
            500,
            "Internal Server Error",
            ResponseBody::Json(json!({"message": 42})),
        ));
        assert_eq!(failure.message(), "Internal Server Error");
    }

    #[test]
    fn test_network_error_uses_unknown_error() {
        let failure = normalize(FailureDetails::no_response("connection refused"));

        assert_eq!(failure.http_status(), 0);
        assert_eq!(failure.status_text(), "");
        assert_eq!(failure.message(), UNKNOWN_ERROR_MESSAGE);
        assert_eq!(failure.kind(), FailureKind::Transport);
        assert_eq!(failure.cause(), Some("connection refused"));
        assert_eq!(failure.raw_body(), &ResponseBody::Empty);
    }

    #[test]
    fn test_api_error_envelope() {
        let failure = normalize(FailureDetails::http(
            400,
            "Bad Request",
            ResponseBody::Json(json!({
                "timestamp": "2024-05-01T10:00:00+09:00",
                "path": "/api/v1/orders",
                "code": "VALIDATION_ERROR",
                "message": "Validation failed",
                "details": ["items: must not be empty"]
            })),
        ));

        assert_eq!(failure.error_code().as_deref(), Some("VALIDATION_ERROR"));
        assert_eq!(failure.details(), vec!["items: must not be empty".to_string()]);
        assert_eq!(failure.message(), "Validation failed");
    }

    #[test]
    fn test_unauthorized() {
        let failure = normalize(FailureDetails::http(401, "Unauthorized", ResponseBody::Empty));
        assert!(failure.is_unauthorized());
        assert_eq!(failure.message(), "Unauthorized");
        assert_eq!(failure.error_code(), None);
        assert!(failure.details().is_empty());
    }

    #[test]
    fn test_status_line() {
        let failure = normalize(FailureDetails::http(409, "Conflict", ResponseBody::Empty));
        assert_eq!(
            failure.status_line("POST", "/api/v1/orders"),
            "POST /api/v1/orders -> 409 Conflict"
        );
        assert_eq!(failure.status_line("", ""), "409 Conflict");
    }

    #[test]
    fn test_display() {
        let network = normalize(FailureDetails::no_response("dns"));
        assert_eq!(network.to_string(), "network error: Unknown error.");

        let api = normalize(FailureDetails::http(
            400,
            "Bad Request",
            ResponseBody::Json(json!({"message": "Insufficient stock"})),
        ));
        assert_eq!(api.to_string(), "HTTP 400 Bad Request: Insufficient stock");
    }

    #[test]
    fn test_response_body_parse() {
        assert_eq!(ResponseBody::parse(""), ResponseBody::Empty);
        assert_eq!(ResponseBody::parse("  \n"), ResponseBody::Empty);
        assert_eq!(ResponseBody::parse(r#"{"a":1}"#), ResponseBody::Json(json!({"a": 1})));
        assert_eq!(ResponseBody::parse("nope"), ResponseBody::Text("nope".to_string()));
    }

    #[test]
    fn test_outcome_accessors() {
        let success = Outcome::Success { payload: json!({"ok": true}) };
        assert!(success.is_success());
        assert_eq!(success.payload(), Some(&json!({"ok": true})));
        assert!(success.failure().is_none());

        let failure = Outcome::Failure(normalize(FailureDetails::no_response("x")));
        assert!(!failure.is_success());
        assert!(failure.payload().is_none());
        assert!(failure.into_result().is_err());
    }

    #[test]
    fn test_outcome_decode() {
        #[derive(serde::Deserialize)]
        struct Flag {
            ok: bool,
        }

        let decoded = Outcome::Success { payload: json!({"ok": true}) }.decode::<Flag>();
        assert!(matches!(decoded, Ok(Flag { ok: true })));

        let bad = Outcome::Success { payload: json!([]) }.decode::<Flag>();
        assert!(matches!(bad, Err(Err(_))));
    }
}
