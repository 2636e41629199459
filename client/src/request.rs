//! Request descriptors
//!
//! A [`RequestDescriptor`] says what to call: method, path, optional JSON
//! body and any extra headers. It carries no credential; the dispatcher adds
//! `Authorization` from the session at send time.

use crate::idempotency::IdempotencyKey;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Header carrying the order idempotency key
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// HTTP method
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    /// Upper-case method name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound call, immutable once built
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use storefront_client::{IdempotencyKey, Method, RequestDescriptor};
///
/// let descriptor = RequestDescriptor::post("/api/v1/orders")
///     .with_json_body(json!({"items": [{"productId": 1, "quantity": 2}]}))
///     .with_idempotency_key(&IdempotencyKey::new("key-1"));
///
/// assert_eq!(descriptor.method(), Method::Post);
/// assert_eq!(descriptor.extra_headers()["Idempotency-Key"], "key-1");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    body: Option<Value>,
    extra_headers: BTreeMap<String, String>,
}

impl RequestDescriptor {
    /// Create a descriptor with no body and no extra headers
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            extra_headers: BTreeMap::new(),
        }
    }

    /// GET descriptor
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// POST descriptor
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Builder: set the JSON body
    #[must_use]
    pub fn with_json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Builder: set the body from any serializable value
    ///
    /// # Errors
    ///
    /// Returns the serializer error if `body` cannot be represented as JSON.
    pub fn with_body<B: Serialize>(self, body: &B) -> Result<Self, serde_json::Error> {
        Ok(self.with_json_body(serde_json::to_value(body)?))
    }

    /// Builder: add an extra header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    /// Builder: attach an idempotency key
    #[must_use]
    pub fn with_idempotency_key(self, key: &IdempotencyKey) -> Self {
        self.with_header(IDEMPOTENCY_KEY_HEADER, key.as_str())
    }

    /// HTTP method
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Path relative to the API base URL, query string included
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// JSON body, if any
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Caller-supplied headers
    #[must_use]
    pub const fn extra_headers(&self) -> &BTreeMap<String, String> {
        &self.extra_headers
    }
}
