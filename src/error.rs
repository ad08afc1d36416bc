//! Error handling for the navigation core.
//!
//! Only the transport-facing paths return errors: a failed login, or a request
//! that keeps failing after the configured retry budget. Everything else in
//! this crate degrades instead of failing — configuration problems (missing or
//! duplicate view modules, anonymous routes) are logged as warnings and
//! navigation continues with a fallback, and authorization mismatches are
//! silent exclusions.
//!
//! [`NavigationResult`] is the outcome of a navigation attempt. Guards in this
//! design never block a navigation, so the only non-success outcome is a path
//! that matches no registered route.

use thiserror::Error;

/// Outcome of a navigation attempt through the guard pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationResult {
    /// Navigation committed; the router now points at `path`.
    Success {
        /// The full path that was navigated to.
        path: String,
    },
    /// No registered route matched the requested path.
    NotFound {
        /// The path that failed to resolve.
        path: String,
    },
}

impl NavigationResult {
    /// Check if navigation was committed.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Check if the path matched no registered route.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The path this result refers to.
    pub fn path(&self) -> &str {
        match self {
            Self::Success { path } | Self::NotFound { path } => path,
        }
    }
}

/// Errors surfaced to callers of the login/session flow.
///
/// These are the only rejection paths in the crate; they are meant to be shown
/// on the login form rather than handled programmatically.
#[derive(Debug, Error)]
pub enum NavError {
    /// The login call was rejected by the backend.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// A request kept failing after exhausting the retry policy.
    #[error("request failed after {attempts} attempts: {message}")]
    RetryExhausted {
        /// Total attempts made, including the first one.
        attempts: u32,
        /// Message from the last failure.
        message: String,
    },

    /// Generic transport failure reported by the HTTP collaborator.
    #[error("transport error: {0}")]
    Transport(String),

    /// A value read from or written to the key-value store failed to
    /// (de)serialize.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
