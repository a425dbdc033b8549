//! The session reconciler.
//!
//! Folds the auth provider's emission stream into a single [`ReconcilerState`]
//! and hands out awaitable refresh completion. The core discipline is the
//! waiter queue: a caller that wants settled state registers a one-shot waiter
//! BEFORE triggering any refresh, and the emission listener drains the whole
//! queue on every settled emission. Registering first means a settle can never
//! slip between the trigger and the await, so no caller is left hanging.

use crate::load_fsm::{LoadMachine, LoadMachineInput, LoadPhase};
use crate::{ReconcilerError, ReconcilerResult, ReconcilerState, SessionSource};
use memoria_auth_client::{Session, SessionEmission, User};
use memoria_storage::TokenStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

struct Inner {
    state: Mutex<ReconcilerState>,
    machine: Mutex<LoadMachine>,
    waiters: Mutex<Vec<oneshot::Sender<()>>>,
    stream_closed: AtomicBool,
    tokens: Arc<TokenStore>,
}

impl Inner {
    /// Register a waiter resolved by the next settled emission.
    ///
    /// The closed check happens under the waiters lock so a concurrent
    /// `close()` cannot slip between the check and the push; a waiter is
    /// either drained by close or never enqueued.
    fn register_waiter(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let mut waiters = self.waiters.lock().unwrap();
        if !self.stream_closed.load(Ordering::SeqCst) {
            waiters.push(tx);
        }
        // When closed, the sender drops here and the receiver fails
        // immediately, which the awaiting caller maps to StreamClosed.
        rx
    }

    /// Fold one emission into the snapshot and token store, then wake waiters
    /// if it settled.
    fn handle_emission(&self, emission: SessionEmission) {
        let settled = emission.is_settled();

        {
            let mut machine = self.machine.lock().unwrap();
            let input = if settled {
                LoadMachineInput::Settled
            } else {
                LoadMachineInput::FetchStarted
            };
            // The load machine accepts every input in every state.
            let _ = machine.consume(&input);
        }

        // Token persistence can hit the disk backend; keep it outside the
        // state lock so snapshot reads never block on storage I/O.
        if let Some(session) = &emission.data {
            self.tokens.store(session.token());
        } else if settled && emission.error.is_none() {
            // A settled null result is authoritative: the backend says
            // there is no session, so any persisted token is stale. Error
            // emissions keep the previous data and never reach this arm,
            // so a network blip cannot wipe the token.
            self.tokens.clear();
        }

        {
            let mut state = self.state.lock().unwrap();
            state.current_session = emission.data;
            state.is_loading = emission.is_pending;
            state.is_refetching = emission.is_refetching;
            state.last_error = emission.error;

            if settled && !state.initial_load_complete {
                state.initial_load_complete = true;
                debug!(
                    authenticated = state.current_session.is_some(),
                    "Initial session load complete"
                );
            }
        }

        if settled {
            let waiters = std::mem::take(&mut *self.waiters.lock().unwrap());
            for waiter in waiters {
                // A dropped receiver means the caller stopped waiting.
                let _ = waiter.send(());
            }
        }
    }

    /// Mark the stream closed and fail every pending waiter.
    ///
    /// Flag and drain happen under the waiters lock, pairing with
    /// [`Self::register_waiter`].
    fn close(&self) {
        let mut waiters = self.waiters.lock().unwrap();
        self.stream_closed.store(true, Ordering::SeqCst);
        waiters.clear();
    }
}

/// Reconciles the session stream into one consistent, queryable snapshot.
///
/// Construct with [`SessionReconciler::start`], which subscribes to the source
/// (kicking off the initial load) and spawns the emission listener. Intended
/// to be wrapped in an `Arc` and shared across guards and interceptors.
pub struct SessionReconciler {
    inner: Arc<Inner>,
    source: Arc<dyn SessionSource>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionReconciler {
    /// Subscribe to the source and start reconciling.
    pub fn start(source: Arc<dyn SessionSource>, tokens: Arc<TokenStore>) -> Self {
        let inner = Arc::new(Inner {
            state: Mutex::new(ReconcilerState::default()),
            machine: Mutex::new(LoadMachine::new()),
            waiters: Mutex::new(Vec::new()),
            stream_closed: AtomicBool::new(false),
            tokens,
        });

        let mut rx = source.subscribe();
        let listener = tokio::spawn({
            let inner = Arc::clone(&inner);
            async move {
                loop {
                    match rx.recv().await {
                        Ok(emission) => inner.handle_emission(emission),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Session stream lagged, catching up");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
                // Failing pending waiters here turns a would-be hang into
                // a StreamClosed error for awaiting callers.
                inner.close();
                debug!("Session stream closed");
            }
        });

        Self {
            inner,
            source,
            listener: Mutex::new(Some(listener)),
        }
    }

    /// A point-in-time copy of the reconciled state.
    pub fn snapshot(&self) -> ReconcilerState {
        self.inner.state.lock().unwrap().clone()
    }

    /// The current session, if authenticated.
    pub fn current_session(&self) -> Option<Session> {
        self.inner.state.lock().unwrap().current_session.clone()
    }

    /// The authenticated user, if any.
    pub fn current_user(&self) -> Option<User> {
        self.inner
            .state
            .lock()
            .unwrap()
            .current_session
            .as_ref()
            .map(|s| s.user.clone())
    }

    /// The current bearer token, if authenticated.
    pub fn current_token(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .unwrap()
            .current_session
            .as_ref()
            .map(|s| s.token().to_string())
    }

    /// Whether a session is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.lock().unwrap().current_session.is_some()
    }

    /// True once the first fetch has settled.
    pub fn initial_load_complete(&self) -> bool {
        self.inner.state.lock().unwrap().initial_load_complete
    }

    /// Error message from the last refresh, if it failed.
    pub fn session_error(&self) -> Option<String> {
        self.inner.state.lock().unwrap().last_error.clone()
    }

    /// Where the snapshot is in its load lifecycle.
    pub fn load_phase(&self) -> LoadPhase {
        LoadPhase::from(self.inner.machine.lock().unwrap().state())
    }

    /// Wait until the initial session load has settled.
    ///
    /// Resolves immediately once the initial load has completed, waits out a
    /// fetch already in flight, and forces a refresh when a persisted token
    /// exists without a session yet (app restart with a saved login).
    pub async fn initialize(&self) -> ReconcilerResult<()> {
        {
            let state = self.inner.state.lock().unwrap();
            if state.initial_load_complete {
                return Ok(());
            }
        }

        let rx = self.inner.register_waiter();

        // Re-check under the registered waiter: a settle between the check
        // above and the registration would otherwise leave us awaiting an
        // emission that may never come.
        let needs_refresh = {
            let state = self.inner.state.lock().unwrap();
            if state.initial_load_complete {
                return Ok(());
            }
            state.is_settled()
                && state.current_session.is_none()
                && self.inner.tokens.has_token()
        };

        if needs_refresh {
            debug!("Persisted token found without a session, refreshing");
            self.spawn_refresh();
        }

        rx.await.map_err(|_| ReconcilerError::StreamClosed)
    }

    /// Trigger a refresh and wait for the next settled emission.
    ///
    /// Overlapping calls are allowed; each triggers its own refresh and all of
    /// them resolve on whichever settle arrives next.
    pub async fn refetch(&self) -> ReconcilerResult<()> {
        let rx = self.inner.register_waiter();
        self.spawn_refresh();
        rx.await.map_err(|_| ReconcilerError::StreamClosed)
    }

    fn spawn_refresh(&self) {
        // Detached so the waiter, not the refresh call itself, decides when
        // the caller resumes.
        let source = Arc::clone(&self.source);
        tokio::spawn(async move { source.trigger_refresh().await });
    }

    /// Stop listening and fail any pending waiters.
    pub fn shutdown(&self) {
        if let Some(handle) = self.listener.lock().unwrap().take() {
            handle.abort();
        }
        self.inner.close();
        debug!("Session reconciler shut down");
    }
}

impl Drop for SessionReconciler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionSource;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use memoria_auth_client::SessionMeta;
    use memoria_storage::MemoryStorage;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::broadcast;

    /// Scriptable stand-in for the auth client's session stream.
    struct FakeSource {
        tx: Mutex<Option<broadcast::Sender<SessionEmission>>>,
        initial: Mutex<Vec<SessionEmission>>,
        on_refresh: Mutex<VecDeque<Vec<SessionEmission>>>,
        refresh_count: AtomicUsize,
        subscribed: AtomicBool,
    }

    impl FakeSource {
        fn new(initial: Vec<SessionEmission>) -> Arc<Self> {
            let (tx, _) = broadcast::channel(32);
            Arc::new(Self {
                tx: Mutex::new(Some(tx)),
                initial: Mutex::new(initial),
                on_refresh: Mutex::new(VecDeque::new()),
                refresh_count: AtomicUsize::new(0),
                subscribed: AtomicBool::new(false),
            })
        }

        fn script_refresh(&self, emissions: Vec<SessionEmission>) {
            self.on_refresh.lock().unwrap().push_back(emissions);
        }

        fn emit(&self, emission: SessionEmission) {
            let guard = self.tx.lock().unwrap();
            let tx = guard.as_ref().expect("stream closed");
            tx.send(emission).expect("no subscribers");
        }

        fn close(&self) {
            self.tx.lock().unwrap().take();
        }

        fn refreshes(&self) -> usize {
            self.refresh_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SessionSource for FakeSource {
        fn subscribe(&self) -> broadcast::Receiver<SessionEmission> {
            let guard = self.tx.lock().unwrap();
            let tx = guard.as_ref().expect("stream closed");
            let rx = tx.subscribe();
            // Initial-load emissions go out on first observation, buffered
            // for the receiver just created.
            if !self.subscribed.swap(true, Ordering::SeqCst) {
                for emission in self.initial.lock().unwrap().drain(..) {
                    let _ = tx.send(emission);
                }
            }
            rx
        }

        async fn trigger_refresh(&self) {
            self.refresh_count.fetch_add(1, Ordering::SeqCst);
            let script = self
                .on_refresh
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default();
            let guard = self.tx.lock().unwrap();
            if let Some(tx) = guard.as_ref() {
                for emission in script {
                    let _ = tx.send(emission);
                }
            }
        }
    }

    fn session(token: &str) -> Session {
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Session {
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
                token: token.to_string(),
                ip_address: None,
                user_agent: None,
            },
        }
    }

    fn pending(data: Option<Session>) -> SessionEmission {
        SessionEmission {
            data,
            is_pending: true,
            is_refetching: false,
            error: None,
        }
    }

    fn refetching(data: Option<Session>) -> SessionEmission {
        SessionEmission {
            data,
            is_pending: false,
            is_refetching: true,
            error: None,
        }
    }

    fn settled(data: Option<Session>) -> SessionEmission {
        SessionEmission {
            data,
            is_pending: false,
            is_refetching: false,
            error: None,
        }
    }

    fn settled_with_error(data: Option<Session>, message: &str) -> SessionEmission {
        SessionEmission {
            data,
            is_pending: false,
            is_refetching: false,
            error: Some(message.to_string()),
        }
    }

    fn token_store() -> Arc<TokenStore> {
        Arc::new(TokenStore::new(Box::new(MemoryStorage::new())))
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn initialize_settles_on_initial_load() {
        let source = FakeSource::new(vec![pending(None), settled(Some(session("tok-1")))]);
        let tokens = token_store();
        let reconciler = SessionReconciler::start(source.clone(), tokens.clone());

        reconciler.initialize().await.unwrap();

        let state = reconciler.snapshot();
        assert!(state.is_authenticated());
        assert!(state.initial_load_complete);
        assert!(state.is_settled());
        assert_eq!(tokens.read().as_deref(), Some("tok-1"));
        assert_eq!(source.refreshes(), 0);
        assert_eq!(reconciler.load_phase(), LoadPhase::Settled);
    }

    #[tokio::test]
    async fn initialize_resolves_immediately_once_complete() {
        let source = FakeSource::new(vec![settled(None)]);
        let reconciler = SessionReconciler::start(source.clone(), token_store());

        reconciler.initialize().await.unwrap();
        reconciler.initialize().await.unwrap();

        assert!(reconciler.initial_load_complete());
        assert_eq!(source.refreshes(), 0);
    }

    #[tokio::test]
    async fn initialize_refreshes_when_persisted_token_has_no_session() {
        let tokens = token_store();
        tokens.store("stale");

        let source = FakeSource::new(vec![]);
        source.script_refresh(vec![pending(None), settled(None)]);
        let reconciler = SessionReconciler::start(source.clone(), tokens.clone());

        reconciler.initialize().await.unwrap();

        assert_eq!(source.refreshes(), 1);
        assert!(!reconciler.is_authenticated());
        assert!(reconciler.initial_load_complete());
        // The settled null result proved the persisted token stale.
        assert!(tokens.read().is_none());
    }

    #[tokio::test]
    async fn initialize_waits_out_a_load_already_in_flight() {
        let source = FakeSource::new(vec![pending(None)]);
        let reconciler = Arc::new(SessionReconciler::start(source.clone(), token_store()));

        wait_until(|| reconciler.snapshot().is_loading).await;

        let pending_init = tokio::spawn({
            let reconciler = reconciler.clone();
            async move { reconciler.initialize().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending_init.is_finished());

        source.emit(settled(Some(session("tok-2"))));
        pending_init.await.unwrap().unwrap();
        assert!(reconciler.is_authenticated());
        assert_eq!(source.refreshes(), 0);
    }

    #[tokio::test]
    async fn concurrent_refetches_all_resolve_on_one_settle() {
        let source = FakeSource::new(vec![settled(None)]);
        let reconciler = Arc::new(SessionReconciler::start(source.clone(), token_store()));
        reconciler.initialize().await.unwrap();

        // Refreshes emit nothing, so the callers stay parked on their
        // waiters until the single settle below.
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let reconciler = reconciler.clone();
                tokio::spawn(async move { reconciler.refetch().await })
            })
            .collect();

        wait_until(|| source.refreshes() == 3).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        source.emit(settled(Some(session("tok-3"))));
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(reconciler.current_token().as_deref(), Some("tok-3"));
    }

    #[tokio::test]
    async fn token_store_follows_settled_emissions() {
        let tokens = token_store();
        let source = FakeSource::new(vec![settled(Some(session("abc")))]);
        let reconciler = SessionReconciler::start(source.clone(), tokens.clone());
        reconciler.initialize().await.unwrap();
        assert_eq!(tokens.read().as_deref(), Some("abc"));

        source.script_refresh(vec![refetching(Some(session("abc"))), settled(None)]);
        reconciler.refetch().await.unwrap();

        assert!(!reconciler.is_authenticated());
        assert!(tokens.read().is_none());
    }

    #[tokio::test]
    async fn transport_error_keeps_session_and_token() {
        let tokens = token_store();
        let source = FakeSource::new(vec![settled(Some(session("abc")))]);
        let reconciler = SessionReconciler::start(source.clone(), tokens.clone());
        reconciler.initialize().await.unwrap();

        source.script_refresh(vec![
            refetching(Some(session("abc"))),
            settled_with_error(Some(session("abc")), "connection refused"),
        ]);
        reconciler.refetch().await.unwrap();

        let state = reconciler.snapshot();
        assert!(state.is_authenticated());
        assert_eq!(state.last_error.as_deref(), Some("connection refused"));
        assert_eq!(tokens.read().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn initial_load_complete_latches_across_refetches() {
        let source = FakeSource::new(vec![settled(Some(session("abc")))]);
        let reconciler = SessionReconciler::start(source.clone(), token_store());
        reconciler.initialize().await.unwrap();

        source.emit(refetching(Some(session("abc"))));
        wait_until(|| reconciler.snapshot().is_refetching).await;

        let state = reconciler.snapshot();
        assert!(state.initial_load_complete);
        assert_eq!(reconciler.load_phase(), LoadPhase::Refetching);
    }

    #[tokio::test]
    async fn waiter_registered_after_close_fails_fast() {
        // Closing and registering race on the same lock; whichever wins, a
        // caller must never end up with a parked waiter that nothing drains.
        let inner = Inner {
            state: Mutex::new(ReconcilerState::default()),
            machine: Mutex::new(LoadMachine::new()),
            waiters: Mutex::new(Vec::new()),
            stream_closed: AtomicBool::new(false),
            tokens: token_store(),
        };

        inner.close();
        let rx = inner.register_waiter();

        assert!(inner.waiters.lock().unwrap().is_empty());
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn refetch_after_shutdown_fails_with_stream_closed() {
        let source = FakeSource::new(vec![settled(None)]);
        let reconciler = SessionReconciler::start(source.clone(), token_store());
        reconciler.initialize().await.unwrap();

        reconciler.shutdown();

        let result = reconciler.refetch().await;
        assert!(matches!(result, Err(ReconcilerError::StreamClosed)));
    }

    #[tokio::test]
    async fn refetch_fails_when_stream_closes() {
        let source = FakeSource::new(vec![]);
        let reconciler = SessionReconciler::start(source.clone(), token_store());

        source.close();
        let result = reconciler.refetch().await;
        assert!(matches!(result, Err(ReconcilerError::StreamClosed)));
    }
}
