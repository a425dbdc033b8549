//! Reconciler error types.

use thiserror::Error;

/// Errors surfaced by reconciler operations.
#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// The session stream closed before the awaited refresh settled.
    #[error("Session stream closed before settling")]
    StreamClosed,
}

/// Result type alias using ReconcilerError.
pub type ReconcilerResult<T> = Result<T, ReconcilerError>;
