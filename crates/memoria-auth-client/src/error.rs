//! Transport-level error types for the auth client.
//!
//! Expected auth failures (wrong password, duplicate email) are *not* errors
//! here; they come back as [`crate::AuthOutcome::Error`] data. This type only
//! covers transport failures: network unreachable, unexpected status codes,
//! malformed responses.

use thiserror::Error;

/// Transport error type for auth provider calls.
#[derive(Error, Debug)]
pub enum AuthError {
    /// HTTP request error (connect failure, timeout, body decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected non-2xx response from the provider
    #[error("Unexpected provider response: HTTP {status} ({body_summary})")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Length/digest summary of the response body
        body_summary: String,
    },
}

impl AuthError {
    /// Returns true if this error is transient and the operation can be
    /// retried (connection failures, timeouts, 5xx responses).
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            AuthError::UnexpectedStatus { status, .. } => (500..600).contains(status),
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
