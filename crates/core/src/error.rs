//! Caller-facing error taxonomy for the engine.
//!
//! Low-level platform failures never escape a public operation raw; they
//! are mapped into these typed results. The status-to-taxonomy mapping is
//! total: every platform status decodes to exactly one variant, with an
//! `Unknown` bucket for anything unrecognized.

use mdm_protocol::{CompletionSignal, InstallStatus};
use thiserror::Error;

/// Why the platform rejected an install or uninstall.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformRejection {
    #[error("aborted by user or caller")]
    Aborted,
    #[error("blocked by policy or system")]
    Blocked,
    #[error("conflict with an existing install or version")]
    Conflict,
    #[error("payload incompatible with this device")]
    Incompatible,
    #[error("payload corrupt or invalid")]
    Invalid,
    #[error("insufficient storage")]
    InsufficientStorage,
    #[error("unknown platform rejection: {0}")]
    Unknown(String),
}

impl PlatformRejection {
    /// Maps a completion signal's status and message into the taxonomy.
    ///
    /// Total over the status set; `Success` and `PendingUserAction` are not
    /// rejections and callers must branch on [`InstallStatus::is_success`]
    /// before calling this.
    pub fn from_signal(signal: &CompletionSignal) -> Self {
        let detail = || {
            signal
                .message
                .clone()
                .unwrap_or_else(|| format!("status code {}", signal.status.code()))
        };
        match signal.status {
            InstallStatus::Aborted => PlatformRejection::Aborted,
            InstallStatus::Blocked => PlatformRejection::Blocked,
            InstallStatus::Conflict => PlatformRejection::Conflict,
            InstallStatus::Incompatible => PlatformRejection::Incompatible,
            InstallStatus::Invalid => PlatformRejection::Invalid,
            InstallStatus::Storage => PlatformRejection::InsufficientStorage,
            InstallStatus::Success
            | InstallStatus::Failure
            | InstallStatus::PendingUserAction
            | InstallStatus::Other(_) => PlatformRejection::Unknown(detail()),
        }
    }
}

/// Terminal failure of an install request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InstallError {
    /// Bad or missing input; nothing was attempted.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The caller does not hold elevated rights and the unprivileged
    /// handoff also failed to dispatch.
    #[error("both install strategies failed; privileged: {privileged}; fallback: {fallback}")]
    StrategiesExhausted { privileged: String, fallback: String },

    /// The unprivileged handoff failed with no privileged attempt made.
    #[error("install handoff failed: {0}")]
    HandoffFailed(String),

    /// The completion channel closed before a resolution arrived.
    #[error("completion channel closed before resolution")]
    ChannelClosed,
}

/// Terminal failure of an uninstall request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UninstallError {
    /// Bad or missing input; nothing was attempted.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Uninstall has no unprivileged fallback.
    #[error("caller does not hold elevated rights")]
    NotPrivileged,

    /// Uninstall setup failed synchronously.
    #[error("uninstall failed to start: {0}")]
    Setup(String),

    /// The platform resolved the session with a failure.
    #[error("platform rejected uninstall: {0}")]
    Rejected(PlatformRejection),

    /// The completion channel closed before a resolution arrived.
    #[error("completion channel closed before resolution")]
    ChannelClosed,
}

/// Terminal failure of a restriction batch or other policy operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// The caller does not hold elevated rights; nothing was attempted.
    #[error("caller does not hold elevated rights")]
    NotPrivileged,

    /// Bad or missing input; nothing was attempted.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The platform rejected a policy mutation outright.
    #[error("policy operation failed: {0}")]
    Platform(String),
}

impl From<mdm_runtime::PlatformError> for PolicyError {
    fn from(err: mdm_runtime::PlatformError) -> Self {
        PolicyError::Platform(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(status: InstallStatus) -> CompletionSignal {
        CompletionSignal {
            status,
            message: Some("detail".to_string()),
        }
    }

    #[test]
    fn every_failure_status_maps_to_one_rejection() {
        let cases = [
            (InstallStatus::Aborted, PlatformRejection::Aborted),
            (InstallStatus::Blocked, PlatformRejection::Blocked),
            (InstallStatus::Conflict, PlatformRejection::Conflict),
            (InstallStatus::Incompatible, PlatformRejection::Incompatible),
            (InstallStatus::Invalid, PlatformRejection::Invalid),
            (InstallStatus::Storage, PlatformRejection::InsufficientStorage),
        ];
        for (status, expected) in cases {
            assert_eq!(PlatformRejection::from_signal(&signal(status)), expected);
        }
    }

    #[test]
    fn unrecognized_statuses_land_in_unknown() {
        for status in [
            InstallStatus::Failure,
            InstallStatus::PendingUserAction,
            InstallStatus::Other(1234),
        ] {
            match PlatformRejection::from_signal(&signal(status)) {
                PlatformRejection::Unknown(detail) => assert_eq!(detail, "detail"),
                other => panic!("expected Unknown, got {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_without_message_carries_the_code() {
        let signal = CompletionSignal {
            status: InstallStatus::Other(77),
            message: None,
        };
        match PlatformRejection::from_signal(&signal) {
            PlatformRejection::Unknown(detail) => assert!(detail.contains("77")),
            other => panic!("expected Unknown, got {other:?}"),
        }
    }
}
