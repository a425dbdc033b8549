//! Reconciled session snapshot.

use memoria_auth_client::{Session, User};

/// A point-in-time view of the reconciled session.
///
/// Folded from the auth provider's emission stream by the reconciler. Cheap to
/// clone and safe to hand to guards and interceptors; it never changes under
/// the holder's feet.
#[derive(Debug, Clone, Default)]
pub struct ReconcilerState {
    /// The current session, if authenticated.
    pub current_session: Option<Session>,
    /// True while the initial load is in flight.
    pub is_loading: bool,
    /// True while a refresh after the initial load is in flight.
    pub is_refetching: bool,
    /// Error message from the last refresh, if it failed.
    pub last_error: Option<String>,
    /// True once the first fetch has settled. Latches: never goes back to
    /// false, even across later refreshes.
    pub initial_load_complete: bool,
}

impl ReconcilerState {
    /// Whether a session is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.current_session.is_some()
    }

    /// The authenticated user, if any.
    pub fn user(&self) -> Option<&User> {
        self.current_session.as_ref().map(|s| &s.user)
    }

    /// The current bearer token, if authenticated.
    pub fn token(&self) -> Option<&str> {
        self.current_session.as_ref().map(|s| s.token())
    }

    /// True when no load or refetch is in flight.
    pub fn is_settled(&self) -> bool {
        !self.is_loading && !self.is_refetching
    }
}
