//! Session identity and completion-signal types.

use serde::{Deserialize, Serialize};

use crate::status::InstallStatus;

/// Opaque identifier correlating an asynchronous completion signal with the
/// pending request that registered it.
///
/// Tokens are unique among concurrently pending sessions; a collision is a
/// correctness bug, not a retryable condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub u64);

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// The kind of unit-of-work a session tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Install,
    Uninstall,
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionKind::Install => write!(f, "install"),
            SessionKind::Uninstall => write!(f, "uninstall"),
        }
    }
}

/// Terminal platform status delivered for a session.
///
/// This is the payload of the asynchronous completion broadcast: a raw
/// platform status plus an optional human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSignal {
    pub status: InstallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CompletionSignal {
    /// A plain success signal.
    pub fn success() -> Self {
        Self {
            status: InstallStatus::Success,
            message: None,
        }
    }

    /// A failure signal with the given status and message.
    pub fn failure(status: InstallStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }
}

/// A completion event as delivered by the platform's notification channel.
///
/// Events carry the token of the session they terminate; events for unknown
/// tokens are stale and must be discarded, never crashed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub token: SessionToken,
    #[serde(flatten)]
    pub signal: CompletionSignal,
}
