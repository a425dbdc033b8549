//! Seam between the reconciler and the auth provider's session stream.

use async_trait::async_trait;
use memoria_auth_client::{AuthClient, SessionEmission};
use tokio::sync::broadcast;
use tracing::warn;

/// Something that emits session snapshots and can be asked to refresh.
///
/// The stream contract: subscribing for the first time starts the initial
/// load, every refresh produces an in-flight emission followed by a settled
/// emission, and transport failures still settle (with `error` set and the
/// previous data kept).
#[async_trait]
pub trait SessionSource: Send + Sync + 'static {
    /// Subscribe to the emission stream.
    fn subscribe(&self) -> broadcast::Receiver<SessionEmission>;

    /// Ask the source to refresh the session from the backend.
    async fn trigger_refresh(&self);
}

#[async_trait]
impl SessionSource for AuthClient {
    fn subscribe(&self) -> broadcast::Receiver<SessionEmission> {
        AuthClient::subscribe(self)
    }

    async fn trigger_refresh(&self) {
        // Transport failures already reach subscribers as a settled emission
        // carrying the error message, so there is nothing to propagate here.
        if let Err(e) = self.refresh_session().await {
            warn!(error = %e, "Session refresh failed");
        }
    }
}
