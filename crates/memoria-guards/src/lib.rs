//! Route guards over the reconciled session state.
//!
//! Guards are pure decisions: given a settled [`ReconcilerState`], either
//! allow navigation or name the route to redirect to. The caller is
//! responsible for awaiting `initialize()` on the reconciler first; guards
//! never block and never trigger fetches themselves.

use memoria_reconciler::ReconcilerState;
use tracing::debug;

/// Well-known route paths the guards redirect to.
pub mod routes {
    /// Sign-in page, the destination for unauthenticated visitors.
    pub const SIGN_IN: &str = "/auth/login";
    /// Post-login landing page.
    pub const HOME: &str = "/home";
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Navigation may proceed.
    Allow,
    /// Navigation is denied; send the visitor to this route instead.
    Redirect(&'static str),
}

impl GuardDecision {
    /// True when navigation may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }

    /// The redirect target, if navigation was denied.
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            GuardDecision::Allow => None,
            GuardDecision::Redirect(route) => Some(route),
        }
    }
}

/// Guard for routes that require a signed-in user.
///
/// Redirects anonymous visitors to the sign-in page.
pub fn require_authenticated(state: &ReconcilerState) -> GuardDecision {
    if state.is_authenticated() {
        GuardDecision::Allow
    } else {
        debug!(target_route = routes::SIGN_IN, "Unauthenticated, redirecting");
        GuardDecision::Redirect(routes::SIGN_IN)
    }
}

/// Guard for routes that only make sense for anonymous visitors, such as the
/// sign-in and sign-up pages.
///
/// Redirects signed-in users to the home page.
pub fn require_anonymous(state: &ReconcilerState) -> GuardDecision {
    if state.is_authenticated() {
        debug!(target_route = routes::HOME, "Already signed in, redirecting");
        GuardDecision::Redirect(routes::HOME)
    } else {
        GuardDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use memoria_auth_client::{Session, SessionMeta, User};

    fn signed_in() -> ReconcilerState {
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        ReconcilerState {
            current_session: Some(Session {
                user: User {
                    id: "user-1".to_string(),
                    email: "ada@memoria.test".to_string(),
                    name: "Ada".to_string(),
                    email_verified: true,
                    image: None,
                    created_at: t,
                    updated_at: t,
                },
                session_meta: SessionMeta {
                    id: "sess-1".to_string(),
                    user_id: "user-1".to_string(),
                    expires_at: t + chrono::Duration::days(7),
                    token: "tok".to_string(),
                    ip_address: None,
                    user_agent: None,
                },
            }),
            initial_load_complete: true,
            ..Default::default()
        }
    }

    fn anonymous() -> ReconcilerState {
        ReconcilerState {
            initial_load_complete: true,
            ..Default::default()
        }
    }

    #[test]
    fn authenticated_guard_allows_signed_in_users() {
        assert_eq!(require_authenticated(&signed_in()), GuardDecision::Allow);
    }

    #[test]
    fn authenticated_guard_redirects_anonymous_to_sign_in() {
        let decision = require_authenticated(&anonymous());
        assert_eq!(decision, GuardDecision::Redirect(routes::SIGN_IN));
        assert_eq!(decision.redirect_target(), Some(routes::SIGN_IN));
    }

    #[test]
    fn anonymous_guard_allows_visitors() {
        assert!(require_anonymous(&anonymous()).is_allowed());
    }

    #[test]
    fn anonymous_guard_redirects_signed_in_users_home() {
        assert_eq!(
            require_anonymous(&signed_in()),
            GuardDecision::Redirect(routes::HOME)
        );
    }
}
