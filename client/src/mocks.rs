//! Mock implementations for testing.
//!
//! In-memory stand-ins for the transport and the clock.

use crate::clock::Clock;
use crate::transport::{RawResponse, Transport, TransportError, TransportRequest, TransportResult};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

/// Mock transport.
///
/// Records every request it is handed and answers with scripted responses
/// in FIFO order. With nothing scripted it reports a transport error.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    requests: Arc<Mutex<Vec<TransportRequest>>>,
    responses: Arc<Mutex<VecDeque<TransportResult>>>,
}

impl MockTransport {
    /// Create a mock transport with nothing scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response with a JSON body.
    pub fn push_json(&self, status: u16, body: Value) {
        self.push_response(status, reason_phrase(status), &body.to_string());
    }

    /// Script a response with an arbitrary body.
    pub fn push_response(&self, status: u16, status_text: &str, body: &str) {
        self.push(Ok(RawResponse {
            status,
            status_text: status_text.to_string(),
            body: body.to_string(),
        }));
    }

    /// Script a failure to obtain any response.
    pub fn push_error(&self, message: &str) {
        self.push(Err(TransportError::new(message)));
    }

    fn push(&self, result: TransportResult) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
    }

    /// Requests received so far (for testing).
    #[must_use]
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received so far (for testing).
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: TransportRequest) -> impl Future<Output = TransportResult> + Send {
        let requests = Arc::clone(&self.requests);
        let responses = Arc::clone(&self.responses);

        async move {
            requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(request);

            responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::new("no scripted response")))
        }
    }
}

fn reason_phrase(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or_default()
}

/// Fixed clock for deterministic tests.
///
/// Time only moves when told to.
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    /// Create a clock stopped at `time`.
    #[must_use]
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time: Arc::new(Mutex::new(time)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
        *time += by;
    }

    /// Jump to a specific time.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.time.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.time.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
