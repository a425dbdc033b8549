//! Wire types for the auth provider contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User record as returned by the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User UUID
    pub id: String,
    /// Email address
    pub email: String,
    /// Display name
    pub name: String,
    /// Whether the email has been verified
    #[serde(default)]
    pub email_verified: bool,
    /// Avatar URL, if set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Account creation time
    pub created_at: DateTime<Utc>,
    /// Last account update time
    pub updated_at: DateTime<Utc>,
}

/// Server-side session record attached to a [`Session`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMeta {
    /// Session UUID
    pub id: String,
    /// Owning user UUID
    pub user_id: String,
    /// Session expiry
    pub expires_at: DateTime<Utc>,
    /// Opaque bearer token for this session
    pub token: String,
    /// Client IP recorded at session creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Client user agent recorded at session creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Immutable session snapshot produced by the provider.
///
/// A new stream emission replaces the whole snapshot; it is never patched in
/// place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The authenticated user
    pub user: User,
    /// Session metadata, including the bearer token
    #[serde(rename = "session")]
    pub session_meta: SessionMeta,
}

impl Session {
    /// The bearer token carried by this session.
    pub fn token(&self) -> &str {
        &self.session_meta.token
    }
}

/// Validation error returned by the provider as data (not thrown).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderError {
    /// HTTP status the provider answered with
    #[serde(skip)]
    pub status: u16,
    /// Machine-readable error code, when the provider sends one
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message for inline display
    #[serde(default = "default_error_message")]
    pub message: String,
}

fn default_error_message() -> String {
    "Authentication failed".to_string()
}

/// Result of a provider operation: either the data or a validation error.
///
/// Transport failures never appear here; they are `Err` at the call site.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome<T> {
    /// The operation succeeded
    Data(T),
    /// The provider rejected the request (bad credentials, duplicate email, ...)
    Error(ProviderError),
}

impl<T> AuthOutcome<T> {
    /// The data, if the operation succeeded.
    pub fn data(self) -> Option<T> {
        match self {
            AuthOutcome::Data(data) => Some(data),
            AuthOutcome::Error(_) => None,
        }
    }

    /// The validation error, if any.
    pub fn error(&self) -> Option<&ProviderError> {
        match self {
            AuthOutcome::Data(_) => None,
            AuthOutcome::Error(e) => Some(e),
        }
    }

    /// Whether the operation succeeded.
    pub fn is_data(&self) -> bool {
        matches!(self, AuthOutcome::Data(_))
    }
}

/// Successful sign-in payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInData {
    /// Bearer token issued for this session, when the provider returns one
    #[serde(default)]
    pub token: Option<String>,
    /// The signed-in user
    pub user: User,
}

/// Successful sign-up payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpData {
    /// Bearer token issued for the new session, when the provider returns one
    #[serde(default)]
    pub token: Option<String>,
    /// The newly created user
    pub user: User,
}

/// One emission of the session stream.
#[derive(Debug, Clone)]
pub struct SessionEmission {
    /// Current session snapshot, if any
    pub data: Option<Session>,
    /// True while the initial load is in flight
    pub is_pending: bool,
    /// True while a refresh after the initial load is in flight
    pub is_refetching: bool,
    /// Transport error message from the last refresh, if it failed
    pub error: Option<String>,
}

impl SessionEmission {
    /// True when no load or refetch is in progress.
    pub fn is_settled(&self) -> bool {
        !self.is_pending && !self.is_refetching
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_json() -> &'static str {
        r#"{
            "user": {
                "id": "user-1",
                "email": "a@memoria.test",
                "name": "Ada",
                "emailVerified": true,
                "createdAt": "2024-01-01T00:00:00Z",
                "updatedAt": "2024-06-01T00:00:00Z"
            },
            "session": {
                "id": "sess-1",
                "userId": "user-1",
                "expiresAt": "2030-01-01T00:00:00Z",
                "token": "tok-abc",
                "ipAddress": "127.0.0.1"
            }
        }"#
    }

    #[test]
    fn session_deserializes_from_provider_json() {
        let session: Session = serde_json::from_str(session_json()).unwrap();
        assert_eq!(session.user.email, "a@memoria.test");
        assert!(session.user.email_verified);
        assert_eq!(session.session_meta.user_id, "user-1");
        assert_eq!(session.token(), "tok-abc");
        assert_eq!(session.session_meta.user_agent, None);
    }

    #[test]
    fn null_session_body_deserializes_to_none() {
        let session: Option<Session> = serde_json::from_str("null").unwrap();
        assert!(session.is_none());
    }

    #[test]
    fn provider_error_defaults() {
        let err: ProviderError = serde_json::from_str("{}").unwrap();
        assert_eq!(err.message, "Authentication failed");
        assert_eq!(err.code, None);
    }

    #[test]
    fn provider_error_with_fields() {
        let err: ProviderError =
            serde_json::from_str(r#"{"message":"Invalid email or password","code":"INVALID_EMAIL_OR_PASSWORD"}"#)
                .unwrap();
        assert_eq!(err.message, "Invalid email or password");
        assert_eq!(err.code.as_deref(), Some("INVALID_EMAIL_OR_PASSWORD"));
    }

    #[test]
    fn outcome_accessors() {
        let ok: AuthOutcome<i32> = AuthOutcome::Data(7);
        assert!(ok.is_data());
        assert_eq!(ok.clone().data(), Some(7));
        assert!(ok.error().is_none());

        let err: AuthOutcome<i32> = AuthOutcome::Error(ProviderError {
            status: 401,
            code: None,
            message: "nope".to_string(),
        });
        assert!(!err.is_data());
        assert_eq!(err.error().unwrap().status, 401);
        assert_eq!(err.data(), None);
    }

    #[test]
    fn emission_settled_predicate() {
        let settled = SessionEmission {
            data: None,
            is_pending: false,
            is_refetching: false,
            error: None,
        };
        assert!(settled.is_settled());

        let pending = SessionEmission {
            is_pending: true,
            ..settled.clone()
        };
        assert!(!pending.is_settled());
    }
}
