//! Engine facade: one object owning the platform, the correlator, and the
//! orchestration and policy components, plus the completion pump that ties
//! the platform's asynchronous event stream to pending sessions.

use std::path::Path;
use std::sync::Arc;

use mdm_protocol::{CompositeResult, InstallOutcome};
use mdm_runtime::Platform;
use tracing::{debug, info, warn};

use crate::correlator::SessionCorrelator;
use crate::error::{InstallError, PolicyError, UninstallError};
use crate::orchestrator::Orchestrator;
use crate::privilege::PrivilegeOracle;
use crate::restrictions::{PolicyEngine, RestrictionChange, KNOWN_RESTRICTIONS};

/// Entry point for every device-management operation.
pub struct DeviceEngine<P: Platform> {
    platform: Arc<P>,
    correlator: Arc<SessionCorrelator>,
    oracle: PrivilegeOracle<P>,
    orchestrator: Orchestrator<P>,
    policy: PolicyEngine<P>,
}

impl<P: Platform> DeviceEngine<P> {
    pub fn new(platform: Arc<P>) -> Self {
        let correlator = Arc::new(SessionCorrelator::new());
        Self {
            oracle: PrivilegeOracle::new(Arc::clone(&platform)),
            orchestrator: Orchestrator::new(Arc::clone(&platform), Arc::clone(&correlator)),
            policy: PolicyEngine::new(Arc::clone(&platform)),
            correlator,
            platform,
        }
    }

    /// Forwards platform completion events to the correlator until the
    /// platform closes its stream. Call once, typically via `tokio::spawn`;
    /// a second call is a logged no-op because the stream is take-once.
    pub async fn run(&self) {
        let Some(mut completions) = self.platform.take_completions() else {
            warn!(target: "mdm", "completion pump already running");
            return;
        };
        debug!(target: "mdm", "completion pump started");
        while let Some(event) = completions.recv().await {
            self.correlator.resolve(event.token, event.signal);
        }
        debug!(target: "mdm", "completion stream closed");
    }

    pub fn is_privileged(&self) -> bool {
        self.oracle.has_elevated_rights()
    }

    pub fn platform_version(&self) -> u32 {
        self.platform.platform_version()
    }

    /// Number of sessions still awaiting a platform completion.
    pub fn pending_sessions(&self) -> usize {
        self.correlator.pending_count()
    }

    pub async fn install_package(&self, path: &Path) -> Result<InstallOutcome, InstallError> {
        self.orchestrator.install_package(path).await
    }

    pub async fn uninstall_package(&self, package_id: &str) -> Result<(), UninstallError> {
        self.orchestrator.uninstall_package(package_id).await
    }

    pub fn apply_restrictions(
        &self,
        changes: &[RestrictionChange],
    ) -> Result<CompositeResult, PolicyError> {
        self.policy.apply_batch(changes)
    }

    /// Applies every known restriction in one batch. First-boot hardening.
    pub fn apply_baseline(&self) -> Result<CompositeResult, PolicyError> {
        let changes: Vec<RestrictionChange> = KNOWN_RESTRICTIONS
            .iter()
            .map(|name| RestrictionChange::new(*name, true))
            .collect();
        info!(target: "mdm.policy", "applying baseline restrictions");
        self.policy.apply_batch(&changes)
    }

    /// Hides an application from the launcher. Privileged only.
    pub fn disable_app(&self, package_id: &str) -> Result<(), PolicyError> {
        if package_id.trim().is_empty() {
            return Err(PolicyError::InvalidInput(
                "package id must not be empty".to_string(),
            ));
        }
        if !self.oracle.has_elevated_rights() {
            return Err(PolicyError::NotPrivileged);
        }
        self.platform.set_app_hidden(package_id, true)?;
        info!(target: "mdm.policy", package_id, "application disabled");
        Ok(())
    }

    pub fn lock_device(&self) -> Result<(), PolicyError> {
        if !self.oracle.has_elevated_rights() {
            return Err(PolicyError::NotPrivileged);
        }
        self.platform.lock_now()?;
        info!(target: "mdm", "device locked");
        Ok(())
    }

    pub fn wipe_data(&self) -> Result<(), PolicyError> {
        if !self.oracle.has_elevated_rights() {
            return Err(PolicyError::NotPrivileged);
        }
        self.platform.wipe_data()?;
        warn!(target: "mdm", "device wipe issued");
        Ok(())
    }

    /// Dispatches the elevation prompt. Fire-and-forget: success means the
    /// prompt was dispatched, not that rights were granted.
    pub fn request_elevation(&self, explanation: &str) -> Result<(), PolicyError> {
        if explanation.trim().is_empty() {
            return Err(PolicyError::InvalidInput(
                "explanation must not be empty".to_string(),
            ));
        }
        self.platform.request_elevation(explanation)?;
        info!(target: "mdm", "elevation prompt dispatched");
        Ok(())
    }
}
