//! Session correlator: maps tokens to pending requests awaiting their
//! asynchronous result.
//!
//! Registration and resolution may race from different execution contexts;
//! the pending table serializes them. Each token is resolved at most once:
//! resolution evicts the entry and fires its oneshot, and any later
//! completion for the same token is a logged no-op, never a crash or a
//! double-invoked callback.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use mdm_protocol::{CompletionSignal, SessionToken};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::session::{Session, SessionState};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CorrelatorError {
    /// The generated token collided with a pending session. This is a
    /// correctness bug in the generator, not a retryable condition.
    #[error("duplicate session token: {0}")]
    DuplicateToken(SessionToken),
}

struct PendingSession {
    session: Session,
    tx: oneshot::Sender<CompletionSignal>,
}

/// Concurrency-safe pending-session table keyed by token.
pub struct SessionCorrelator {
    next_token: AtomicU64,
    pending: Mutex<HashMap<SessionToken, PendingSession>>,
}

impl SessionCorrelator {
    pub fn new() -> Self {
        Self {
            next_token: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Stores `session` under a fresh token and returns the receiver its
    /// resolution will arrive on.
    pub fn register(
        &self,
        mut session: Session,
    ) -> Result<(SessionToken, oneshot::Receiver<CompletionSignal>), CorrelatorError> {
        let token = SessionToken(self.next_token.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = oneshot::channel();

        session.state = SessionState::AwaitingCompletion;

        let mut pending = self.pending.lock();
        if pending.contains_key(&token) {
            return Err(CorrelatorError::DuplicateToken(token));
        }
        debug!(
            target: "mdm.session",
            %token,
            kind = %session.kind,
            target_ref = %session.target,
            "session registered"
        );
        pending.insert(token, PendingSession { session, tx });
        Ok((token, rx))
    }

    /// Delivers `signal` to the session registered under `token`.
    ///
    /// Returns true when a pending session was resolved. An unknown token
    /// (already resolved, or a caller that never existed) is logged as a
    /// stale completion and ignored.
    pub fn resolve(&self, token: SessionToken, signal: CompletionSignal) -> bool {
        let entry = self.pending.lock().remove(&token);
        let Some(PendingSession { mut session, tx }) = entry else {
            warn!(target: "mdm.session", %token, "stale completion discarded");
            return false;
        };

        session.state = if signal.status.is_success() {
            SessionState::Succeeded
        } else {
            SessionState::Failed(
                signal
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("status code {}", signal.status.code())),
            )
        };
        debug!(
            target: "mdm.session",
            %token,
            status = signal.status.code(),
            terminal = ?session.state,
            "session resolved"
        );

        // The registering caller may have stopped waiting; delivery into a
        // closed channel is discarded, not an error.
        if tx.send(signal).is_err() {
            debug!(target: "mdm.session", %token, "resolution discarded; caller gone");
        }
        true
    }

    /// Evicts a registration whose submission failed before the platform
    /// could ever deliver a completion. No callback fires.
    pub fn abandon(&self, token: SessionToken) -> bool {
        let removed = self.pending.lock().remove(&token).is_some();
        if removed {
            debug!(target: "mdm.session", %token, "session abandoned before submission");
        }
        removed
    }

    /// Number of sessions still awaiting completion. Observability hook.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl Default for SessionCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mdm_protocol::{InstallStatus, SessionKind};

    use super::*;

    fn install_session() -> Session {
        Session::new(SessionKind::Install, "/tmp/app.apk")
    }

    #[test]
    fn register_issues_unique_tokens() {
        let correlator = SessionCorrelator::new();
        let (t1, _rx1) = correlator.register(install_session()).unwrap();
        let (t2, _rx2) = correlator.register(install_session()).unwrap();
        let (t3, _rx3) = correlator.register(install_session()).unwrap();
        assert_ne!(t1, t2);
        assert_ne!(t2, t3);
        assert_eq!(correlator.pending_count(), 3);
    }

    #[tokio::test]
    async fn resolve_delivers_signal_and_evicts() {
        let correlator = SessionCorrelator::new();
        let (token, rx) = correlator.register(install_session()).unwrap();

        assert!(correlator.resolve(token, CompletionSignal::success()));
        assert_eq!(correlator.pending_count(), 0);

        let signal = rx.await.unwrap();
        assert!(signal.status.is_success());
    }

    #[tokio::test]
    async fn second_resolution_is_a_stale_noop() {
        let correlator = SessionCorrelator::new();
        let (token, rx) = correlator.register(install_session()).unwrap();

        assert!(correlator.resolve(token, CompletionSignal::success()));
        assert!(!correlator.resolve(
            token,
            CompletionSignal::failure(InstallStatus::Blocked, "late duplicate")
        ));

        // Exactly one delivery, carrying the first outcome.
        let signal = rx.await.unwrap();
        assert_eq!(signal.status, InstallStatus::Success);
    }

    #[test]
    fn resolving_unknown_token_is_safe() {
        let correlator = SessionCorrelator::new();
        assert!(!correlator.resolve(SessionToken(999), CompletionSignal::success()));
        assert_eq!(correlator.pending_count(), 0);
    }

    #[test]
    fn abandon_evicts_without_firing() {
        let correlator = SessionCorrelator::new();
        let (token, mut rx) = correlator.register(install_session()).unwrap();

        assert!(correlator.abandon(token));
        assert_eq!(correlator.pending_count(), 0);
        assert!(!correlator.abandon(token));

        // Sender side dropped with the eviction.
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn resolution_after_caller_gave_up_is_discarded() {
        let correlator = SessionCorrelator::new();
        let (token, rx) = correlator.register(install_session()).unwrap();
        drop(rx);

        // Still counts as resolved: the entry is evicted, nothing panics.
        assert!(correlator.resolve(token, CompletionSignal::success()));
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registration_and_resolution() {
        let correlator = Arc::new(SessionCorrelator::new());
        let mut receivers = Vec::new();
        for _ in 0..16 {
            let (token, rx) = correlator.register(install_session()).unwrap();
            receivers.push((token, rx));
        }

        let mut handles = Vec::new();
        for (token, _) in &receivers {
            let correlator = Arc::clone(&correlator);
            let token = *token;
            handles.push(tokio::spawn(async move {
                correlator.resolve(token, CompletionSignal::success())
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(correlator.pending_count(), 0);
        for (_, rx) in receivers {
            assert!(rx.await.unwrap().status.is_success());
        }
    }
}
