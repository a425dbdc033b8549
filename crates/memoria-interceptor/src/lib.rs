//! Bearer-token decoration for outgoing backend requests.
//!
//! Reads the current token from the reconciler's cached snapshot and attaches
//! it as an `Authorization: Bearer` header. Requests made while anonymous are
//! forwarded untouched. Purely synchronous; never triggers a session fetch.

use memoria_reconciler::SessionReconciler;
use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use std::sync::Arc;
use tracing::trace;

/// Decorates outgoing requests with the reconciled session's bearer token.
#[derive(Clone)]
pub struct BearerInterceptor {
    reconciler: Arc<SessionReconciler>,
}

impl BearerInterceptor {
    /// Create an interceptor backed by the given reconciler.
    pub fn new(reconciler: Arc<SessionReconciler>) -> Self {
        Self { reconciler }
    }

    /// Attach the current bearer token, if any, to the request.
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self.reconciler.current_token() {
            Some(token) => {
                trace!("Attaching bearer token to outgoing request");
                request.header(AUTHORIZATION, format!("Bearer {token}"))
            }
            None => request,
        }
    }
}
