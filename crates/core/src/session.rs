//! Session bookkeeping for asynchronous install/uninstall work.

use std::time::Instant;

use mdm_protocol::SessionKind;

/// Lifecycle of a session. A session leaves `AwaitingCompletion` at most
/// once; `Succeeded` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Submitted,
    AwaitingCompletion,
    FallbackInProgress,
    Succeeded,
    Failed(String),
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Succeeded | SessionState::Failed(_))
    }
}

/// A unit-of-work handle for one asynchronous install or uninstall,
/// owned exclusively by the orchestrator for its lifetime.
#[derive(Debug, Clone)]
pub struct Session {
    pub kind: SessionKind,
    /// Source path for installs, package id for uninstalls.
    pub target: String,
    pub created_at: Instant,
    pub state: SessionState,
}

impl Session {
    pub fn new(kind: SessionKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            created_at: Instant::now(),
            state: SessionState::Created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sessions_start_created() {
        let session = Session::new(SessionKind::Install, "/tmp/app.apk");
        assert_eq!(session.state, SessionState::Created);
        assert!(!session.state.is_terminal());
    }

    #[test]
    fn terminal_states() {
        assert!(SessionState::Succeeded.is_terminal());
        assert!(SessionState::Failed("boom".to_string()).is_terminal());
        assert!(!SessionState::AwaitingCompletion.is_terminal());
        assert!(!SessionState::FallbackInProgress.is_terminal());
    }
}
