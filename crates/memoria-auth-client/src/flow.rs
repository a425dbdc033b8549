//! Sign-in/up/out flow helper.
//!
//! Thin stateful wrapper over [`AuthClient`] for form-driven callers: tracks
//! an in-flight flag and the last inline error message, and collapses the
//! outcome to a success bool. Navigation stays with the caller.

use crate::{AuthClient, AuthResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::warn;

/// Auth flow state for interactive sign-in/sign-up forms.
pub struct AuthFlow {
    client: AuthClient,
    loading: AtomicBool,
    error: Mutex<Option<String>>,
}

impl AuthFlow {
    /// Create a flow over the given client.
    pub fn new(client: AuthClient) -> Self {
        Self {
            client,
            loading: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    /// Whether an operation is currently in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// The last inline error message, if any.
    pub fn last_error(&self) -> Option<String> {
        self.error.lock().unwrap().clone()
    }

    fn set_error(&self, message: Option<String>) {
        *self.error.lock().unwrap() = message;
    }

    /// Sign in; returns true on success. Validation failures land in
    /// [`Self::last_error`], transport failures are returned.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> AuthResult<bool> {
        self.loading.store(true, Ordering::SeqCst);
        self.set_error(None);

        let result = self.client.sign_in(email, password, remember_me).await;
        self.loading.store(false, Ordering::SeqCst);

        match result {
            Ok(outcome) => {
                if let Some(err) = outcome.error() {
                    self.set_error(Some(err.message.clone()));
                    return Ok(false);
                }
                Ok(true)
            }
            Err(e) => {
                self.set_error(Some("An unexpected error occurred".to_string()));
                Err(e)
            }
        }
    }

    /// Create an account; returns true on success.
    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> AuthResult<bool> {
        self.loading.store(true, Ordering::SeqCst);
        self.set_error(None);

        let result = self.client.sign_up(email, password, name).await;
        self.loading.store(false, Ordering::SeqCst);

        match result {
            Ok(outcome) => {
                if let Some(err) = outcome.error() {
                    self.set_error(Some(err.message.clone()));
                    return Ok(false);
                }
                Ok(true)
            }
            Err(e) => {
                self.set_error(Some("An unexpected error occurred".to_string()));
                Err(e)
            }
        }
    }

    /// Sign out. Failures are logged, never surfaced to forms.
    pub async fn sign_out(&self) {
        match self.client.sign_out().await {
            Ok(outcome) => {
                if let Some(err) = outcome.error() {
                    warn!(status = err.status, message = %err.message, "Sign out rejected");
                }
            }
            Err(e) => warn!(error = %e, "Sign out failed"),
        }
    }
}
