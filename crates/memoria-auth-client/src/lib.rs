//! Auth provider client adapter for the Memoria client core.
//!
//! This crate wraps the external auth provider's HTTP contract
//! (`/api/auth/sign-in/email`, `/sign-up/email`, `/sign-out`, `/get-session`)
//! behind a uniform interface, parameterized by base URL and credential
//! transport (cookie jar vs. bearer token). It also owns the push-based
//! session stream that downstream state (the reconciler) subscribes to.

mod client;
mod error;
mod flow;
mod types;

pub use client::{AuthClient, CredentialTransport};
pub use error::{AuthError, AuthResult};
pub use flow::AuthFlow;
pub use types::{
    AuthOutcome, ProviderError, Session, SessionEmission, SessionMeta, SignInData, SignUpData,
    User,
};
