//! HTTP client adapter for the auth provider.

use crate::types::{
    AuthOutcome, ProviderError, Session, SessionEmission, SignInData, SignUpData,
};
use crate::{AuthError, AuthResult};
use memoria_storage::TokenStore;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

/// Stream buffer: emissions come in in-flight/settled pairs, so even a slow
/// subscriber has plenty of headroom before lagging.
const STREAM_CAPACITY: usize = 32;

/// How the client proves its identity to the provider.
///
/// Fixed at adapter construction; a process uses exactly one transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialTransport {
    /// Browser flow: the HTTP client's cookie jar carries the session cookie.
    Cookie,
    /// Native flow: `Authorization: Bearer <token>` read from the token store
    /// on every request.
    Bearer,
}

struct StreamState {
    tx: broadcast::Sender<SessionEmission>,
    last_session: Mutex<Option<Session>>,
    has_settled: AtomicBool,
    started: AtomicBool,
}

/// Auth provider client.
///
/// Cheap to clone; clones share the HTTP connection pool, the token store,
/// and the session stream.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: Url,
    transport: CredentialTransport,
    tokens: Arc<TokenStore>,
    stream: Arc<StreamState>,
}

impl AuthClient {
    /// Create a new client against the given backend base URL.
    pub fn new(
        base_url: Url,
        transport: CredentialTransport,
        tokens: Arc<TokenStore>,
    ) -> AuthResult<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(transport == CredentialTransport::Cookie)
            .build()?;

        let (tx, _) = broadcast::channel(STREAM_CAPACITY);

        Ok(Self {
            http,
            base_url,
            transport,
            tokens,
            stream: Arc::new(StreamState {
                tx,
                last_session: Mutex::new(None),
                has_settled: AtomicBool::new(false),
                started: AtomicBool::new(false),
            }),
        })
    }

    /// The transport this adapter was constructed with.
    pub fn transport(&self) -> CredentialTransport {
        self.transport
    }

    /// Build the URL for an auth provider operation.
    fn endpoint(&self, operation: &str) -> Url {
        let mut url = self.base_url.clone();
        let path = format!(
            "{}/api/auth/{}",
            self.base_url.path().trim_end_matches('/'),
            operation
        );
        url.set_path(&path);
        url
    }

    /// Attach the credential for this transport.
    ///
    /// Cookie transport needs nothing here; the jar is on the HTTP client.
    fn apply_auth(&self, req: RequestBuilder) -> RequestBuilder {
        match self.transport {
            CredentialTransport::Cookie => req,
            CredentialTransport::Bearer => match self.tokens.read() {
                Some(token) => req.header(AUTHORIZATION, format!("Bearer {token}")),
                None => req,
            },
        }
    }

    /// Sign in with email and password.
    ///
    /// Wrong credentials come back as [`AuthOutcome::Error`]; only transport
    /// failures are `Err`. On success the session stream refreshes.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> AuthResult<AuthOutcome<SignInData>> {
        let url = self.endpoint("sign-in/email");
        debug!(url = %url, email = %email, "Signing in");

        let response = self
            .apply_auth(self.http.post(url))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "rememberMe": remember_me,
            }))
            .send()
            .await?;

        let outcome: AuthOutcome<SignInData> = outcome_from(response).await?;

        if let AuthOutcome::Data(data) = &outcome {
            // On the bearer transport the follow-up get-session must already
            // carry the fresh token, so persist it before refreshing.
            if self.transport == CredentialTransport::Bearer {
                if let Some(token) = &data.token {
                    self.tokens.store(token);
                }
            }
            self.refresh_after_auth_change().await;
        }

        Ok(outcome)
    }

    /// Create an account with email, password, and display name.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> AuthResult<AuthOutcome<SignUpData>> {
        let url = self.endpoint("sign-up/email");
        debug!(url = %url, email = %email, "Signing up");

        let response = self
            .apply_auth(self.http.post(url))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "name": name,
            }))
            .send()
            .await?;

        let outcome: AuthOutcome<SignUpData> = outcome_from(response).await?;

        if let AuthOutcome::Data(data) = &outcome {
            if self.transport == CredentialTransport::Bearer {
                if let Some(token) = &data.token {
                    self.tokens.store(token);
                }
            }
            self.refresh_after_auth_change().await;
        }

        Ok(outcome)
    }

    /// Sign out the current session.
    pub async fn sign_out(&self) -> AuthResult<AuthOutcome<()>> {
        let url = self.endpoint("sign-out");
        debug!(url = %url, "Signing out");

        let response = self.apply_auth(self.http.post(url)).send().await?;

        let status = response.status();
        let outcome = if status.is_success() {
            AuthOutcome::Data(())
        } else if status.is_client_error() {
            AuthOutcome::Error(provider_error(status, response).await)
        } else {
            return Err(unexpected_status(status, response).await);
        };

        if outcome.is_data() {
            // The follow-up get-session settles to no-session, which is what
            // clears the persisted token downstream.
            self.refresh_after_auth_change().await;
        }

        Ok(outcome)
    }

    /// Fetch the current session. `Data(None)` means anonymous.
    pub async fn get_session(&self) -> AuthResult<AuthOutcome<Option<Session>>> {
        let url = self.endpoint("get-session");
        debug!(url = %url, "Fetching session");

        let response = self.apply_auth(self.http.get(url)).send().await?;

        let status = response.status();
        if status.is_success() {
            let session: Option<Session> = response.json().await?;
            return Ok(AuthOutcome::Data(session));
        }

        // An unauthenticated credential is the normal anonymous case, not a
        // validation error worth surfacing.
        if status == StatusCode::UNAUTHORIZED {
            return Ok(AuthOutcome::Data(None));
        }

        if status.is_client_error() {
            return Ok(AuthOutcome::Error(provider_error(status, response).await));
        }

        Err(unexpected_status(status, response).await)
    }

    /// Subscribe to the session stream.
    ///
    /// The first subscription triggers the initial session load, so every
    /// subscriber is guaranteed an eventual settled emission.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEmission> {
        let rx = self.stream.tx.subscribe();
        if !self.stream.started.swap(true, Ordering::SeqCst) {
            let client = self.clone();
            tokio::spawn(async move {
                if let Err(e) = client.refresh_session().await {
                    warn!(error = %e, "Initial session load failed");
                }
            });
        }
        rx
    }

    /// Refresh the session and push the result through the stream.
    ///
    /// Emits an in-flight emission (pending before the first settle,
    /// refetching afterwards), performs `get-session`, then emits a settled
    /// emission. Transport failures settle the stream with `error` set and
    /// the previous data left in place, so a network blip never looks like a
    /// sign-out.
    pub async fn refresh_session(&self) -> AuthResult<()> {
        let settled_before = self.stream.has_settled.load(Ordering::SeqCst);
        let previous = self.stream.last_session.lock().unwrap().clone();

        self.emit(SessionEmission {
            data: previous.clone(),
            is_pending: !settled_before,
            is_refetching: settled_before,
            error: None,
        });

        let result = self.get_session().await;
        self.stream.has_settled.store(true, Ordering::SeqCst);

        match result {
            Ok(AuthOutcome::Data(session)) => {
                *self.stream.last_session.lock().unwrap() = session.clone();
                self.emit(SessionEmission {
                    data: session,
                    is_pending: false,
                    is_refetching: false,
                    error: None,
                });
                Ok(())
            }
            Ok(AuthOutcome::Error(provider_err)) => {
                // Provider refused the credential outright; treat as signed out.
                warn!(status = provider_err.status, message = %provider_err.message,
                    "Provider rejected session fetch");
                *self.stream.last_session.lock().unwrap() = None;
                self.emit(SessionEmission {
                    data: None,
                    is_pending: false,
                    is_refetching: false,
                    error: None,
                });
                Ok(())
            }
            Err(e) => {
                self.emit(SessionEmission {
                    data: previous,
                    is_pending: false,
                    is_refetching: false,
                    error: Some(e.to_string()),
                });
                Err(e)
            }
        }
    }

    /// Refresh after sign-in/up/out; failures surface via the stream's error
    /// field, not as call-site errors.
    async fn refresh_after_auth_change(&self) {
        if let Err(e) = self.refresh_session().await {
            warn!(error = %e, "Session refresh after auth change failed");
        }
    }

    fn emit(&self, emission: SessionEmission) {
        // No subscribers yet is fine; the emission is simply dropped.
        let _ = self.stream.tx.send(emission);
    }
}

/// Classify a provider response: 2xx parses as data, 4xx as a validation
/// error, anything else is a transport failure.
async fn outcome_from<T: DeserializeOwned>(response: Response) -> AuthResult<AuthOutcome<T>> {
    let status = response.status();

    if status.is_success() {
        return Ok(AuthOutcome::Data(response.json().await?));
    }

    if status.is_client_error() {
        return Ok(AuthOutcome::Error(provider_error(status, response).await));
    }

    Err(unexpected_status(status, response).await)
}

async fn provider_error(status: StatusCode, response: Response) -> ProviderError {
    let body = response.text().await.unwrap_or_default();
    let mut err: ProviderError = serde_json::from_str(&body).unwrap_or(ProviderError {
        status: 0,
        code: None,
        message: "Authentication failed".to_string(),
    });
    err.status = status.as_u16();
    err
}

async fn unexpected_status(status: StatusCode, response: Response) -> AuthError {
    let body = response.text().await.unwrap_or_default();
    AuthError::UnexpectedStatus {
        status: status.as_u16(),
        body_summary: summarize_response_body(&body),
    }
}

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}
