//! The authenticated request pipeline.
//!
//! The only entry point collaborators use. Attaches the committed access
//! token, classifies the attempt, and on a 401 drives one refresh and at
//! most one replay. Collaborators never see `Unauthenticated`; they see
//! `Success`, `OtherError`, or the terminal `SessionExpired`.

use std::sync::Arc;

use tokio::sync::watch;
use tollgate_domain::{
    ExecuteOutcome, PipelineOutcome, RefreshOutcome, RequestDescriptor, SessionState, TokenPair,
};
use tracing::{debug, warn};

use crate::coordinator::RefreshCoordinator;
use crate::ports::{RefreshTransport, RequestExecutor};
use crate::store::TokenStore;

/// Orchestrates authenticated requests for one logical session.
///
/// One instance per session; share it behind an [`Arc`]. The store and
/// coordinator are injected so their state has a single, explicit owner.
pub struct AuthenticatedPipeline {
    store: TokenStore,
    coordinator: RefreshCoordinator,
    executor: Arc<dyn RequestExecutor>,
    transport: Arc<dyn RefreshTransport>,
    session: watch::Sender<SessionState>,
}

impl AuthenticatedPipeline {
    /// Wires a pipeline from its collaborating parts.
    #[must_use]
    pub fn new(
        store: TokenStore,
        coordinator: RefreshCoordinator,
        executor: Arc<dyn RequestExecutor>,
        transport: Arc<dyn RefreshTransport>,
    ) -> Self {
        let (session, _) = watch::channel(SessionState::Anonymous);
        Self {
            store,
            coordinator,
            executor,
            transport,
            session,
        }
    }

    /// Handles one request end to end.
    ///
    /// Reads the committed pair (absent is legal; the request proceeds
    /// unauthenticated), executes once, and resolves a 401 through the
    /// refresh coordinator with a replay budget of one.
    pub async fn handle(&self, request: RequestDescriptor) -> PipelineOutcome {
        let observed = self.store.read().await;
        let access_token = observed.as_ref().map(|pair| pair.access_token.clone());

        debug!(
            request_id = %request.id,
            method = %request.method,
            path = %request.path,
            authenticated = access_token.is_some(),
            "executing request"
        );

        match self.executor.execute(&request, access_token.as_deref()).await {
            ExecuteOutcome::Success(payload) => PipelineOutcome::Success(payload),
            ExecuteOutcome::OtherError(kind) => PipelineOutcome::OtherError(kind),
            ExecuteOutcome::Unauthenticated if request.is_replay() => {
                // Replay budget already spent; never loop against a server
                // that keeps answering 401.
                self.expire().await
            }
            ExecuteOutcome::Unauthenticated => self.refresh_and_replay(request, observed).await,
        }
    }

    /// Commits a pair obtained by an external login flow.
    pub async fn establish(&self, pair: TokenPair) {
        self.store.write(pair.clone()).await;
        self.session.send_replace(SessionState::authenticated(pair));
    }

    /// Loads a persisted session at startup, publishing the resulting state.
    pub async fn hydrate(&self) {
        self.store.hydrate().await;
        let state = self
            .store
            .read()
            .await
            .map_or(SessionState::Anonymous, SessionState::authenticated);
        self.session.send_replace(state);
    }

    /// Ends the session: best-effort revoke, then erase local state.
    ///
    /// The revoke call mirrors the issuer's logout endpoint; its failure is
    /// logged and otherwise ignored, because local credentials are cleared
    /// regardless.
    pub async fn logout(&self) {
        if let Some(pair) = self.store.read().await
            && let Some(refresh_token) = pair.refresh_token
            && let Err(error) = self.transport.revoke(&refresh_token).await
        {
            warn!(%error, "logout revoke call failed");
        }
        self.store.clear().await;
        self.session.send_replace(SessionState::Anonymous);
    }

    /// Returns a receiver of session-state transitions.
    ///
    /// `Expired` is the one signal that must trigger re-authentication;
    /// everything else is informational.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    /// Runs the refresh path and the single replay.
    async fn refresh_and_replay(
        &self,
        request: RequestDescriptor,
        observed: Option<TokenPair>,
    ) -> PipelineOutcome {
        if let Some(stale) = observed.clone() {
            self.session
                .send_replace(SessionState::Refreshing { stale });
        }

        match self.coordinator.ensure_fresh(observed.as_ref()).await {
            RefreshOutcome::Refreshed(pair) => {
                let replay = request.into_replay();
                debug!(request_id = %replay.id, "replaying request with refreshed token");
                match self
                    .executor
                    .execute(&replay, Some(pair.access_token.as_str()))
                    .await
                {
                    ExecuteOutcome::Success(payload) => {
                        self.session
                            .send_replace(SessionState::authenticated(pair));
                        PipelineOutcome::Success(payload)
                    }
                    ExecuteOutcome::OtherError(kind) => {
                        // The session renewed fine; the request itself failed.
                        self.session
                            .send_replace(SessionState::authenticated(pair));
                        PipelineOutcome::OtherError(kind)
                    }
                    ExecuteOutcome::Unauthenticated => {
                        // The server rejected a token it just issued; there
                        // is no usable session to keep.
                        self.store.clear().await;
                        self.expire().await
                    }
                }
            }
            RefreshOutcome::SessionExpired => self.expire().await,
        }
    }

    async fn expire(&self) -> PipelineOutcome {
        self.session.send_replace(SessionState::Expired);
        PipelineOutcome::SessionExpired
    }
}

impl std::fmt::Debug for AuthenticatedPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedPipeline")
            .field("session", &*self.session.borrow())
            .finish_non_exhaustive()
    }
}
