//! Fake platform for unit testing orchestration and policy flows.
//!
//! Provides an in-memory device: installed packages, active restrictions,
//! staged sessions, and a completion channel. Completions for committed
//! sessions are scripted per target or injected manually, so tests can
//! exercise success, rejection, duplicate delivery, and stale delivery
//! without a device.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mdm_protocol::{CompletionEvent, CompletionSignal, InstallStatus, SessionToken};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::platform::{
    DeliveryMode, HandoffRef, OwnerState, Platform, PlatformError, PlatformResult, StagingId,
};

/// Record of a committed staging session, for test inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedSession {
    pub id: StagingId,
    pub token: SessionToken,
    pub delivery: DeliveryMode,
    pub bytes_written: usize,
}

/// Record of a begun uninstall, for test inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BegunUninstall {
    pub package_id: String,
    pub token: SessionToken,
    pub delivery: DeliveryMode,
}

#[derive(Debug, Default)]
struct FakeState {
    next_staging_id: u64,
    staged_bytes: BTreeMap<u64, usize>,
    committed: Vec<CommittedSession>,
    uninstalls: Vec<BegunUninstall>,
    handoffs: Vec<HandoffRef>,
    restrictions: BTreeSet<String>,
    installed: BTreeSet<String>,
    enforce_installed: bool,
    hidden_apps: BTreeSet<String>,
    suspended_packages: BTreeSet<String>,
    status_bar_disabled: bool,
    location_forced: bool,
    locked: bool,
    wiped: bool,
    elevation_requests: Vec<String>,
    // failure injection
    fail_open_staging: Option<String>,
    fail_commit: Option<String>,
    fail_handoff: Option<String>,
    failing_restrictions: BTreeSet<String>,
    fail_surface_control: Option<String>,
    // scripted completion status applied to every commit/uninstall
    scripted_status: Option<InstallStatus>,
    auto_complete: bool,
}

/// In-memory [`Platform`] implementation.
pub struct FakePlatform {
    owner: Mutex<OwnerState>,
    version: u32,
    state: Mutex<FakeState>,
    completion_tx: mpsc::UnboundedSender<CompletionEvent>,
    completion_rx: Mutex<Option<mpsc::UnboundedReceiver<CompletionEvent>>>,
}

impl FakePlatform {
    /// A fake device with the given rights and platform version.
    /// Committed sessions auto-complete with success unless scripted.
    pub fn new(owner: OwnerState, version: u32) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            owner: Mutex::new(owner),
            version,
            state: Mutex::new(FakeState {
                auto_complete: true,
                ..FakeState::default()
            }),
            completion_tx: tx,
            completion_rx: Mutex::new(Some(rx)),
        })
    }

    /// Shorthand for an owner-privileged device on a recent platform.
    pub fn privileged() -> Arc<Self> {
        Self::new(OwnerState::Owner, 34)
    }

    /// Shorthand for an unprivileged device on a recent platform.
    pub fn unprivileged() -> Arc<Self> {
        Self::new(OwnerState::NotOwner, 34)
    }

    pub fn set_owner(&self, owner: OwnerState) {
        *self.owner.lock() = owner;
    }

    /// Scripts the completion status delivered for every committed session.
    pub fn script_completion(&self, status: InstallStatus) {
        self.state.lock().scripted_status = Some(status);
    }

    /// Disables automatic completion; tests drive resolution through
    /// [`FakePlatform::inject_completion`].
    pub fn manual_completion(&self) {
        self.state.lock().auto_complete = false;
    }

    /// Injects a raw completion event, bypassing any scripted behavior.
    /// Use this to simulate duplicate or stale platform broadcasts.
    pub fn inject_completion(&self, token: SessionToken, signal: CompletionSignal) {
        let _ = self.completion_tx.send(CompletionEvent { token, signal });
    }

    pub fn fail_open_staging(&self, reason: impl Into<String>) {
        self.state.lock().fail_open_staging = Some(reason.into());
    }

    pub fn fail_commit(&self, reason: impl Into<String>) {
        self.state.lock().fail_commit = Some(reason.into());
    }

    pub fn fail_handoff(&self, reason: impl Into<String>) {
        self.state.lock().fail_handoff = Some(reason.into());
    }

    /// Makes add/clear fail for the given restriction key.
    pub fn fail_restriction(&self, key: impl Into<String>) {
        self.state.lock().failing_restrictions.insert(key.into());
    }

    /// Makes hide/suspend of application surfaces fail.
    pub fn fail_surface_control(&self, reason: impl Into<String>) {
        self.state.lock().fail_surface_control = Some(reason.into());
    }

    /// Seeds an already-active restriction.
    pub fn seed_restriction(&self, key: impl Into<String>) {
        self.state.lock().restrictions.insert(key.into());
    }

    /// Seeds an installed package and turns on installed-set enforcement:
    /// uninstalls of unseeded packages resolve with a failure signal.
    pub fn seed_installed(&self, package_id: impl Into<String>) {
        let mut state = self.state.lock();
        state.enforce_installed = true;
        state.installed.insert(package_id.into());
    }

    // --- inspection ---

    pub fn committed_sessions(&self) -> Vec<CommittedSession> {
        self.state.lock().committed.clone()
    }

    pub fn begun_uninstalls(&self) -> Vec<BegunUninstall> {
        self.state.lock().uninstalls.clone()
    }

    pub fn dispatched_handoffs(&self) -> Vec<HandoffRef> {
        self.state.lock().handoffs.clone()
    }

    pub fn hidden_apps(&self) -> BTreeSet<String> {
        self.state.lock().hidden_apps.clone()
    }

    pub fn suspended_packages(&self) -> BTreeSet<String> {
        self.state.lock().suspended_packages.clone()
    }

    pub fn status_bar_disabled(&self) -> bool {
        self.state.lock().status_bar_disabled
    }

    pub fn location_forced(&self) -> bool {
        self.state.lock().location_forced
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().locked
    }

    pub fn is_wiped(&self) -> bool {
        self.state.lock().wiped
    }

    pub fn elevation_requests(&self) -> Vec<String> {
        self.state.lock().elevation_requests.clone()
    }

    fn completion_for(&self, state: &FakeState) -> CompletionSignal {
        match state.scripted_status {
            Some(status) if !status.is_success() => {
                CompletionSignal::failure(status, "scripted platform failure")
            }
            Some(_) | None => CompletionSignal::success(),
        }
    }
}

impl Platform for FakePlatform {
    fn owner_state(&self) -> OwnerState {
        *self.owner.lock()
    }

    fn platform_version(&self) -> u32 {
        self.version
    }

    fn open_staging_session(&self) -> PlatformResult<StagingId> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.fail_open_staging {
            return Err(PlatformError::StagingFailed(reason.clone()));
        }
        let id = state.next_staging_id;
        state.next_staging_id += 1;
        state.staged_bytes.insert(id, 0);
        Ok(StagingId(id))
    }

    fn write_staging(&self, id: StagingId, _name: &str, bytes: &[u8]) -> PlatformResult<()> {
        let mut state = self.state.lock();
        let Some(written) = state.staged_bytes.get_mut(&id.0) else {
            return Err(PlatformError::StagingFailed(format!(
                "no open staging session {}",
                id.0
            )));
        };
        *written += bytes.len();
        Ok(())
    }

    fn commit_staging(
        &self,
        id: StagingId,
        token: SessionToken,
        delivery: &DeliveryMode,
    ) -> PlatformResult<()> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.fail_commit {
            return Err(PlatformError::CommitFailed(reason.clone()));
        }
        let Some(bytes_written) = state.staged_bytes.remove(&id.0) else {
            return Err(PlatformError::CommitFailed(format!(
                "no open staging session {}",
                id.0
            )));
        };
        state.committed.push(CommittedSession {
            id,
            token,
            delivery: *delivery,
            bytes_written,
        });
        if state.auto_complete {
            let signal = self.completion_for(&state);
            let _ = self.completion_tx.send(CompletionEvent { token, signal });
        }
        Ok(())
    }

    fn begin_uninstall(
        &self,
        package_id: &str,
        token: SessionToken,
        delivery: &DeliveryMode,
    ) -> PlatformResult<()> {
        let mut state = self.state.lock();
        state.uninstalls.push(BegunUninstall {
            package_id: package_id.to_string(),
            token,
            delivery: *delivery,
        });
        if state.enforce_installed && !state.installed.remove(package_id) {
            let signal =
                CompletionSignal::failure(InstallStatus::Failure, "package not installed");
            let _ = self.completion_tx.send(CompletionEvent { token, signal });
            return Ok(());
        }
        if state.auto_complete {
            let signal = self.completion_for(&state);
            let _ = self.completion_tx.send(CompletionEvent { token, signal });
        }
        Ok(())
    }

    fn take_completions(&self) -> Option<mpsc::UnboundedReceiver<CompletionEvent>> {
        self.completion_rx.lock().take()
    }

    fn stage_for_handoff(&self, source: &Path) -> PlatformResult<HandoffRef> {
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "payload.apk".to_string());
        Ok(HandoffRef {
            staged_path: PathBuf::from("/data/local/staging").join(&file_name),
            content_handle: format!("content://mdm.staging/{file_name}"),
        })
    }

    fn dispatch_user_install(&self, handoff: &HandoffRef) -> PlatformResult<()> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.fail_handoff {
            return Err(PlatformError::HandoffFailed(reason.clone()));
        }
        state.handoffs.push(handoff.clone());
        Ok(())
    }

    fn active_restrictions(&self) -> PlatformResult<BTreeSet<String>> {
        Ok(self.state.lock().restrictions.clone())
    }

    fn add_restriction(&self, key: &str) -> PlatformResult<()> {
        let mut state = self.state.lock();
        if state.failing_restrictions.contains(key) {
            return Err(PlatformError::PolicyRejected(format!(
                "restriction {key} rejected"
            )));
        }
        state.restrictions.insert(key.to_string());
        Ok(())
    }

    fn clear_restriction(&self, key: &str) -> PlatformResult<()> {
        let mut state = self.state.lock();
        if state.failing_restrictions.contains(key) {
            return Err(PlatformError::PolicyRejected(format!(
                "restriction {key} rejected"
            )));
        }
        state.restrictions.remove(key);
        Ok(())
    }

    fn set_app_hidden(&self, package_id: &str, hidden: bool) -> PlatformResult<()> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.fail_surface_control {
            return Err(PlatformError::PolicyRejected(reason.clone()));
        }
        if hidden {
            state.hidden_apps.insert(package_id.to_string());
        } else {
            state.hidden_apps.remove(package_id);
        }
        Ok(())
    }

    fn set_packages_suspended(&self, package_ids: &[&str], suspended: bool) -> PlatformResult<()> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.fail_surface_control {
            return Err(PlatformError::PolicyRejected(reason.clone()));
        }
        for package_id in package_ids {
            if suspended {
                state.suspended_packages.insert((*package_id).to_string());
            } else {
                state.suspended_packages.remove(*package_id);
            }
        }
        Ok(())
    }

    fn set_status_bar_disabled(&self, disabled: bool) -> PlatformResult<()> {
        self.state.lock().status_bar_disabled = disabled;
        Ok(())
    }

    fn set_location_enabled(&self, enabled: bool) -> PlatformResult<()> {
        self.state.lock().location_forced = enabled;
        Ok(())
    }

    fn lock_now(&self) -> PlatformResult<()> {
        self.state.lock().locked = true;
        Ok(())
    }

    fn wipe_data(&self) -> PlatformResult<()> {
        self.state.lock().wiped = true;
        Ok(())
    }

    fn request_elevation(&self, explanation: &str) -> PlatformResult<()> {
        self.state
            .lock()
            .elevation_requests
            .push(explanation.to_string());
        Ok(())
    }
}
