//! Single-flight token refresh coordination.
//!
//! However many requests fail authentication concurrently, exactly one
//! refresh call goes out, and every concurrent failure observes its single
//! outcome.
//!
//! The coordinator is a two-state machine: `Idle`, or `InFlight` holding a
//! shared watch receiver for the outcome. The `Idle -> InFlight` transition
//! happens under a mutex, so a check-then-act race cannot start a second
//! call. The refresh itself runs in a spawned task: cancelling any waiting
//! caller never aborts the shared operation, and the task resets the state
//! to `Idle` before releasing waiters, so a failed refresh cannot lock out
//! a later attempt after a fresh login.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tollgate_domain::{RefreshError, RefreshOutcome, TokenPair};
use tracing::{debug, info, warn};

use crate::ports::RefreshTransport;
use crate::store::TokenStore;

/// Default bound on a refresh exchange.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared handle to an in-flight refresh. `None` until the outcome is
/// published.
type OutcomeReceiver = watch::Receiver<Option<RefreshOutcome>>;

/// De-duplicates concurrent refresh needs into one network call.
///
/// Cloning produces another handle to the same coordination state; one
/// instance serves one logical session.
#[derive(Clone)]
pub struct RefreshCoordinator {
    store: TokenStore,
    transport: Arc<dyn RefreshTransport>,
    inflight: Arc<Mutex<Option<OutcomeReceiver>>>,
    timeout: Duration,
}

impl RefreshCoordinator {
    /// Creates a coordinator over the given store and transport.
    #[must_use]
    pub fn new(store: TokenStore, transport: Arc<dyn RefreshTransport>) -> Self {
        Self {
            store,
            transport,
            inflight: Arc::new(Mutex::new(None)),
            timeout: DEFAULT_REFRESH_TIMEOUT,
        }
    }

    /// Overrides the refresh bound.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ensures a fresh pair is committed, given the pair observed when the
    /// 401 occurred.
    ///
    /// - An absent observed pair means the request went out unauthenticated;
    ///   there is nothing to renew.
    /// - If the committed pair already differs from the observed one, a
    ///   concurrent refresh finished first: the committed pair is returned
    ///   without a network call.
    /// - If a refresh is in flight, the caller attaches to it and receives
    ///   the shared outcome.
    /// - Otherwise one refresh call is started. On success the new pair is
    ///   committed before any waiter resolves; on any failure (rejection,
    ///   transport error, malformed response, timeout) the store is cleared
    ///   and every waiter resolves `SessionExpired`. The failure is not
    ///   retried.
    pub async fn ensure_fresh(&self, observed: Option<&TokenPair>) -> RefreshOutcome {
        let Some(observed) = observed else {
            return RefreshOutcome::SessionExpired;
        };

        let mut rx = {
            let mut inflight = self.inflight.lock().await;
            if let Some(rx) = inflight.as_ref() {
                debug!("refresh already in flight; attaching as waiter");
                rx.clone()
            } else {
                match self.store.read().await {
                    // A concurrent refresh already failed and cleared the
                    // store; this session is over.
                    None => return RefreshOutcome::SessionExpired,
                    // A concurrent refresh already committed a newer pair.
                    Some(current) if !current.same_access_token(observed) => {
                        debug!("observed pair is already superseded; skipping refresh");
                        return RefreshOutcome::Refreshed(current);
                    }
                    Some(current) => {
                        let Some(refresh_token) = current.refresh_token.clone() else {
                            warn!("access token rejected and no refresh token held");
                            self.store.clear().await;
                            return RefreshOutcome::SessionExpired;
                        };
                        let (tx, rx) = watch::channel(None);
                        *inflight = Some(rx.clone());
                        self.spawn_refresh(current, refresh_token, tx);
                        rx
                    }
                }
            }
        };

        // A dropped sender means the refresh task died before publishing;
        // fail closed rather than hang.
        match rx.wait_for(Option::is_some).await {
            Ok(guard) => (*guard).clone().unwrap_or(RefreshOutcome::SessionExpired),
            Err(_) => RefreshOutcome::SessionExpired,
        }
    }

    /// Runs the single refresh call in its own task.
    fn spawn_refresh(
        &self,
        stale: TokenPair,
        refresh_token: String,
        tx: watch::Sender<Option<RefreshOutcome>>,
    ) {
        let store = self.store.clone();
        let transport = Arc::clone(&self.transport);
        let inflight = Arc::clone(&self.inflight);
        let bound = self.timeout;

        tokio::spawn(async move {
            let result = match tokio::time::timeout(bound, transport.exchange(&refresh_token)).await
            {
                Ok(result) => result,
                Err(_) => Err(RefreshError::TimedOut {
                    timeout_ms: u64::try_from(bound.as_millis()).unwrap_or(u64::MAX),
                }),
            };

            // The transport guards against this too, but a pair without an
            // access token must never be committed.
            let result = result.and_then(|tokens| {
                if tokens.access_token.is_empty() {
                    Err(RefreshError::MalformedResponse)
                } else {
                    Ok(tokens)
                }
            });

            let outcome = match result {
                Ok(tokens) => {
                    let pair = stale.rotated(tokens.access_token, tokens.refresh_token);
                    // Commit before any waiter observes the outcome.
                    store.write(pair.clone()).await;
                    info!(
                        access_token = %pair.access_token_preview(),
                        "token refresh succeeded"
                    );
                    RefreshOutcome::Refreshed(pair)
                }
                Err(error) => {
                    warn!(%error, "token refresh failed; session expired");
                    store.clear().await;
                    RefreshOutcome::SessionExpired
                }
            };

            // Back to Idle before waiters are released, so the next need
            // can start a new refresh even if this one failed.
            *inflight.lock().await = None;
            let _ = tx.send(Some(outcome));
        });
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ports::RefreshedTokens;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transport double that counts calls and resolves after a pause, so
    /// paused-clock tests can pile up waiters deterministically.
    struct FakeTransport {
        calls: AtomicUsize,
        delay: Duration,
        result: Result<RefreshedTokens, RefreshError>,
    }

    impl FakeTransport {
        fn succeeding() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: Duration::from_millis(50),
                result: Ok(RefreshedTokens {
                    access_token: "A2".to_string(),
                    refresh_token: Some("R2".to_string()),
                }),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: Duration::from_millis(50),
                result: Err(RefreshError::Rejected { status: 401 }),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RefreshTransport for FakeTransport {
        async fn exchange(&self, _refresh_token: &str) -> Result<RefreshedTokens, RefreshError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.result.clone()
        }

        async fn revoke(&self, _refresh_token: &str) -> Result<(), RefreshError> {
            Ok(())
        }
    }

    /// Transport whose exchange never resolves.
    struct StalledTransport;

    #[async_trait]
    impl RefreshTransport for StalledTransport {
        async fn exchange(&self, _refresh_token: &str) -> Result<RefreshedTokens, RefreshError> {
            std::future::pending().await
        }

        async fn revoke(&self, _refresh_token: &str) -> Result<(), RefreshError> {
            Ok(())
        }
    }

    fn coordinator_with(transport: Arc<FakeTransport>) -> (RefreshCoordinator, TokenStore) {
        let store = TokenStore::in_memory();
        let coordinator = RefreshCoordinator::new(store.clone(), transport);
        (coordinator, store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_refresh() {
        let transport = Arc::new(FakeTransport::succeeding());
        let (coordinator, store) = coordinator_with(Arc::clone(&transport));
        store.write(TokenPair::new("A1", "R1")).await;

        let stale = TokenPair::new("A1", "R1");
        let (a, b, c) = tokio::join!(
            coordinator.ensure_fresh(Some(&stale)),
            coordinator.ensure_fresh(Some(&stale)),
            coordinator.ensure_fresh(Some(&stale)),
        );

        let expected = RefreshOutcome::Refreshed(TokenPair::new("A2", "R2"));
        assert_eq!(a, expected);
        assert_eq!(b, expected);
        assert_eq!(c, expected);
        assert_eq!(transport.calls(), 1);
        assert_eq!(store.read().await, Some(TokenPair::new("A2", "R2")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_pair_skips_network_call() {
        let transport = Arc::new(FakeTransport::succeeding());
        let (coordinator, store) = coordinator_with(Arc::clone(&transport));
        store.write(TokenPair::new("A2", "R2")).await;

        // The observed pair was already replaced by a refresh that finished
        // before this caller arrived.
        let stale = TokenPair::new("A1", "R1");
        let outcome = coordinator.ensure_fresh(Some(&stale)).await;

        assert_eq!(outcome, RefreshOutcome::Refreshed(TokenPair::new("A2", "R2")));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_clears_store_and_expires_waiters() {
        let transport = Arc::new(FakeTransport::failing());
        let (coordinator, store) = coordinator_with(Arc::clone(&transport));
        store.write(TokenPair::new("A1", "R1")).await;

        let stale = TokenPair::new("A1", "R1");
        let (a, b) = tokio::join!(
            coordinator.ensure_fresh(Some(&stale)),
            coordinator.ensure_fresh(Some(&stale)),
        );

        assert_eq!(a, RefreshOutcome::SessionExpired);
        assert_eq!(b, RefreshOutcome::SessionExpired);
        assert_eq!(transport.calls(), 1);
        assert_eq!(store.read().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_returns_to_idle_for_next_session() {
        let transport = Arc::new(FakeTransport::failing());
        let (coordinator, store) = coordinator_with(Arc::clone(&transport));
        store.write(TokenPair::new("A1", "R1")).await;

        let stale = TokenPair::new("A1", "R1");
        assert_eq!(
            coordinator.ensure_fresh(Some(&stale)).await,
            RefreshOutcome::SessionExpired
        );

        // A fresh login commits a new pair; the coordinator must be usable
        // again, not locked by the earlier failure.
        store.write(TokenPair::new("B1", "S1")).await;
        let stale = TokenPair::new("B1", "S1");
        assert_eq!(
            coordinator.ensure_fresh(Some(&stale)).await,
            RefreshOutcome::SessionExpired
        );
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_refresh_token_short_circuits() {
        let transport = Arc::new(FakeTransport::succeeding());
        let (coordinator, store) = coordinator_with(Arc::clone(&transport));
        store.write(TokenPair::access_only("A1")).await;

        let stale = TokenPair::access_only("A1");
        let outcome = coordinator.ensure_fresh(Some(&stale)).await;

        assert_eq!(outcome, RefreshOutcome::SessionExpired);
        assert_eq!(transport.calls(), 0);
        assert_eq!(store.read().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_store_means_expired() {
        let transport = Arc::new(FakeTransport::succeeding());
        let (coordinator, _store) = coordinator_with(Arc::clone(&transport));

        let stale = TokenPair::new("A1", "R1");
        let outcome = coordinator.ensure_fresh(Some(&stale)).await;

        assert_eq!(outcome, RefreshOutcome::SessionExpired);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_observed_pair_means_expired() {
        let transport = Arc::new(FakeTransport::succeeding());
        let (coordinator, _store) = coordinator_with(Arc::clone(&transport));

        assert_eq!(
            coordinator.ensure_fresh(None).await,
            RefreshOutcome::SessionExpired
        );
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_refresh_times_out_and_releases_waiters() {
        let store = TokenStore::in_memory();
        store.write(TokenPair::new("A1", "R1")).await;
        let coordinator = RefreshCoordinator::new(store.clone(), Arc::new(StalledTransport))
            .with_timeout(Duration::from_secs(1));

        let stale = TokenPair::new("A1", "R1");
        let (a, b) = tokio::join!(
            coordinator.ensure_fresh(Some(&stale)),
            coordinator.ensure_fresh(Some(&stale)),
        );

        assert_eq!(a, RefreshOutcome::SessionExpired);
        assert_eq!(b, RefreshOutcome::SessionExpired);
        assert_eq!(store.read().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_access_token_in_response_is_malformed() {
        let store = TokenStore::in_memory();
        store.write(TokenPair::new("A1", "R1")).await;
        let transport = Arc::new(FakeTransport {
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(10),
            result: Ok(RefreshedTokens {
                access_token: String::new(),
                refresh_token: None,
            }),
        });
        let coordinator = RefreshCoordinator::new(store.clone(), transport);

        let stale = TokenPair::new("A1", "R1");
        assert_eq!(
            coordinator.ensure_fresh(Some(&stale)).await,
            RefreshOutcome::SessionExpired
        );
        assert_eq!(store.read().await, None);
    }
}
