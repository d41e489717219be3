//! Platform install/uninstall status codes.
//!
//! The numeric values mirror the platform installer's broadcast extras; the
//! conversion from raw code to `InstallStatus` is total, with an explicit
//! `Other` bucket so unrecognized codes are carried rather than dropped.

use serde::{Deserialize, Serialize};

/// Raw status code signalling the session completed successfully.
pub const STATUS_SUCCESS: i32 = 0;
/// Generic failure with no further classification.
pub const STATUS_FAILURE: i32 = 1;
/// The operation was blocked by policy or the system.
pub const STATUS_FAILURE_BLOCKED: i32 = 2;
/// The user or caller aborted the operation.
pub const STATUS_FAILURE_ABORTED: i32 = 3;
/// The payload was rejected as corrupt or malformed.
pub const STATUS_FAILURE_INVALID: i32 = 4;
/// The operation conflicts with an existing install or version.
pub const STATUS_FAILURE_CONFLICT: i32 = 5;
/// Insufficient storage to complete the operation.
pub const STATUS_FAILURE_STORAGE: i32 = 6;
/// The payload is incompatible with this device.
pub const STATUS_FAILURE_INCOMPATIBLE: i32 = 7;
/// The platform is waiting on user confirmation before proceeding.
pub const STATUS_PENDING_USER_ACTION: i32 = -1;

/// Decoded platform status for a completed (or pending) session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    Success,
    Failure,
    Blocked,
    Aborted,
    Invalid,
    Conflict,
    Storage,
    Incompatible,
    PendingUserAction,
    /// A status code outside the known set, preserved verbatim.
    Other(i32),
}

impl InstallStatus {
    /// Decodes a raw platform status code. Total: every code maps to
    /// exactly one variant.
    pub fn from_code(code: i32) -> Self {
        match code {
            STATUS_SUCCESS => InstallStatus::Success,
            STATUS_FAILURE => InstallStatus::Failure,
            STATUS_FAILURE_BLOCKED => InstallStatus::Blocked,
            STATUS_FAILURE_ABORTED => InstallStatus::Aborted,
            STATUS_FAILURE_INVALID => InstallStatus::Invalid,
            STATUS_FAILURE_CONFLICT => InstallStatus::Conflict,
            STATUS_FAILURE_STORAGE => InstallStatus::Storage,
            STATUS_FAILURE_INCOMPATIBLE => InstallStatus::Incompatible,
            STATUS_PENDING_USER_ACTION => InstallStatus::PendingUserAction,
            other => InstallStatus::Other(other),
        }
    }

    /// The raw platform code this status decodes from.
    pub fn code(&self) -> i32 {
        match self {
            InstallStatus::Success => STATUS_SUCCESS,
            InstallStatus::Failure => STATUS_FAILURE,
            InstallStatus::Blocked => STATUS_FAILURE_BLOCKED,
            InstallStatus::Aborted => STATUS_FAILURE_ABORTED,
            InstallStatus::Invalid => STATUS_FAILURE_INVALID,
            InstallStatus::Conflict => STATUS_FAILURE_CONFLICT,
            InstallStatus::Storage => STATUS_FAILURE_STORAGE,
            InstallStatus::Incompatible => STATUS_FAILURE_INCOMPATIBLE,
            InstallStatus::PendingUserAction => STATUS_PENDING_USER_ACTION,
            InstallStatus::Other(code) => *code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InstallStatus::Success)
    }
}
