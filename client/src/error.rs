//! Error types for storefront actions

use crate::normalize::Failure;
use thiserror::Error;

/// Advisory shown when a signed-in action is attempted without a credential
pub const AUTHENTICATION_REQUIRED_ADVISORY: &str =
    "Authentication required: log in to obtain an access token first";

/// Errors returned by [`Storefront`](crate::Storefront) actions
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    /// Rejected locally; no request was sent
    #[error("{}", AUTHENTICATION_REQUIRED_ADVISORY)]
    AuthenticationRequired,

    /// The request was sent and did not succeed
    #[error(transparent)]
    Failed(#[from] Failure),

    /// The request succeeded but the payload had an unexpected shape
    #[error("Unexpected response payload: {0}")]
    UnexpectedPayload(String),
}

impl ActionError {
    /// The normalized failure, when a request was actually sent and failed
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(failure) => Some(failure),
            Self::AuthenticationRequired | Self::UnexpectedPayload(_) => None,
        }
    }

    /// Whether the action was refused locally for lack of a credential
    #[must_use]
    pub const fn is_authentication_required(&self) -> bool {
        matches!(self, Self::AuthenticationRequired)
    }
}

/// Result type for storefront actions
pub type Result<T> = std::result::Result<T, ActionError>;
