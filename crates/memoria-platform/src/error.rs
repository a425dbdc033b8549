//! Error types for platform detection and URL resolution.

use thiserror::Error;

/// Errors that can occur while resolving the backend base URL.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// URL parsing error
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The resolved URL has a host that cannot be rewritten
    #[error("Cannot rewrite host for URL: {0}")]
    HostRewrite(String),

    /// Web platform with no environment URL and no page origin to fall back to
    #[error("No backend URL available for the web platform")]
    NoWebOrigin,
}

/// Result type alias using PlatformError.
pub type PlatformResult<T> = Result<T, PlatformError>;
