//! The `Platform` trait and its boundary types.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use mdm_protocol::{CompletionEvent, SessionToken};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors surfaced by the platform boundary.
///
/// These are raw collaborator failures; the engine maps them into its own
/// caller-facing taxonomy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    /// The device policy service rejected the call.
    #[error("policy rejected: {0}")]
    PolicyRejected(String),

    /// A package staging session could not be opened or written.
    #[error("staging session failed: {0}")]
    StagingFailed(String),

    /// Committing a staged session failed synchronously.
    #[error("commit failed: {0}")]
    CommitFailed(String),

    /// The user-mediated install handoff could not be dispatched.
    #[error("handoff dispatch failed: {0}")]
    HandoffFailed(String),

    /// The underlying platform query failed for an unknown reason.
    #[error("platform query failed: {0}")]
    QueryFailed(String),
}

/// Convenience alias for platform-boundary results.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Whether the caller currently holds owner-level management rights.
///
/// `Unknown` means the underlying query itself failed; the engine never
/// assumes elevated rights on doubt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerState {
    Owner,
    NotOwner,
    Unknown,
}

/// Mutability constraint on the completion intent for a session kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentMutability {
    /// The receiver may mutate the intent before dispatch.
    Mutable,
    /// The intent is sealed at creation.
    Immutable,
    /// No constraint; the platform default applies.
    Unconstrained,
}

/// How an asynchronous completion signal may be delivered for a session.
///
/// Produced by the capability probe, consumed verbatim by the platform when
/// committing a session or beginning an uninstall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryMode {
    /// Reuse an existing pending delivery for the same token.
    pub update_current: bool,
    /// Mutability of the completion intent.
    pub mutability: IntentMutability,
    /// Restrict completion delivery to this package's own receivers.
    pub scoped_receiver: bool,
}

/// Handle to an open package staging session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StagingId(pub u64);

/// Scoped reference to a payload staged for the user-mediated install flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffRef {
    /// Private, engine-readable copy of the payload.
    pub staged_path: PathBuf,
    /// Opaque content handle exposed to the installer UI.
    pub content_handle: String,
}

/// Everything the engine consumes from the device.
///
/// Methods are synchronous from the engine's point of view; the only
/// asynchronous surface is the completion-event channel, which delivers
/// terminal statuses for committed sessions on an independent execution
/// context.
pub trait Platform: Send + Sync + 'static {
    /// Current owner-level rights of the caller.
    fn owner_state(&self) -> OwnerState;

    /// Host platform version, as used by the capability probe.
    fn platform_version(&self) -> u32;

    // --- package sessions (privileged strategy) ---

    /// Opens a staging session for a full install.
    fn open_staging_session(&self) -> PlatformResult<StagingId>;

    /// Streams payload bytes into an open staging session.
    fn write_staging(&self, id: StagingId, name: &str, bytes: &[u8]) -> PlatformResult<()>;

    /// Finalizes a staged session. The terminal status arrives later as a
    /// [`CompletionEvent`] carrying `token`.
    fn commit_staging(
        &self,
        id: StagingId,
        token: SessionToken,
        delivery: &DeliveryMode,
    ) -> PlatformResult<()>;

    /// Begins a privileged uninstall keyed to `package_id`. The terminal
    /// status arrives later as a [`CompletionEvent`] carrying `token`.
    fn begin_uninstall(
        &self,
        package_id: &str,
        token: SessionToken,
        delivery: &DeliveryMode,
    ) -> PlatformResult<()>;

    /// Takes the completion-event receiver. Yields `Some` exactly once;
    /// the engine's completion pump is the sole consumer.
    fn take_completions(&self) -> Option<mpsc::UnboundedReceiver<CompletionEvent>>;

    // --- unprivileged strategy ---

    /// Copies the payload into a private staging area and returns a scoped
    /// reference for the user-mediated flow.
    fn stage_for_handoff(&self, source: &Path) -> PlatformResult<HandoffRef>;

    /// Dispatches the user-mediated install flow for a staged payload.
    /// Success means the dispatch itself succeeded, independent of whether
    /// the end user approves.
    fn dispatch_user_install(&self, handoff: &HandoffRef) -> PlatformResult<()>;

    // --- device policy ---

    /// The set of restriction keys currently active.
    fn active_restrictions(&self) -> PlatformResult<BTreeSet<String>>;

    /// Activates a restriction by key.
    fn add_restriction(&self, key: &str) -> PlatformResult<()>;

    /// Clears a restriction by key.
    fn clear_restriction(&self, key: &str) -> PlatformResult<()>;

    /// Hides or reveals an application surface.
    fn set_app_hidden(&self, package_id: &str, hidden: bool) -> PlatformResult<()>;

    /// Suspends or resumes a set of packages.
    fn set_packages_suspended(&self, package_ids: &[&str], suspended: bool) -> PlatformResult<()>;

    /// Disables or restores the status bar.
    fn set_status_bar_disabled(&self, disabled: bool) -> PlatformResult<()>;

    /// Forces device location on or releases the override.
    fn set_location_enabled(&self, enabled: bool) -> PlatformResult<()>;

    /// Locks the device immediately.
    fn lock_now(&self) -> PlatformResult<()>;

    /// Factory-resets the device.
    fn wipe_data(&self) -> PlatformResult<()>;

    /// Fire-and-forget dispatch of the elevation prompt.
    fn request_elevation(&self, explanation: &str) -> PlatformResult<()>;
}

impl DeliveryMode {
    /// Mode with no constraints, useful as a test default.
    pub fn unconstrained() -> Self {
        Self {
            update_current: true,
            mutability: IntentMutability::Unconstrained,
            scoped_receiver: false,
        }
    }
}
