//! Install/uninstall orchestration.
//!
//! Drives the full lifecycle: validate input, select a strategy from the
//! privilege oracle and capability probe, execute it, register with the
//! session correlator, and resolve the caller's pending result - falling
//! back to the user-mediated flow when the privileged strategy fails,
//! whether its commit setup failed synchronously or its asynchronous
//! completion reported failure.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use mdm_protocol::{CompletionSignal, InstallOutcome, SessionKind};
use mdm_runtime::Platform;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::capability::CapabilityProbe;
use crate::correlator::SessionCorrelator;
use crate::error::{InstallError, PlatformRejection, UninstallError};
use crate::privilege::PrivilegeOracle;
use crate::session::{Session, SessionState};

const PAYLOAD_EXTENSION: &str = "apk";
const STAGING_CHUNK: usize = 8192;

/// Orchestrates install and uninstall sessions against the platform.
pub struct Orchestrator<P: Platform> {
    platform: Arc<P>,
    oracle: PrivilegeOracle<P>,
    probe: CapabilityProbe,
    correlator: Arc<SessionCorrelator>,
}

impl<P: Platform> Orchestrator<P> {
    pub fn new(platform: Arc<P>, correlator: Arc<SessionCorrelator>) -> Self {
        let probe = CapabilityProbe::new(platform.platform_version());
        Self {
            oracle: PrivilegeOracle::new(Arc::clone(&platform)),
            platform,
            probe,
            correlator,
        }
    }

    /// Installs the package at `path`.
    ///
    /// Privileged callers get the silent staging strategy with fallback to
    /// the user-mediated flow; unprivileged callers go straight to the
    /// user-mediated flow. Preconditions are checked before any side
    /// effect; a violation registers nothing with the correlator.
    pub async fn install_package(&self, path: &Path) -> Result<InstallOutcome, InstallError> {
        validate_install_source(path)?;

        let mut session = Session::new(SessionKind::Install, path.display().to_string());

        if !self.oracle.has_elevated_rights() {
            debug!(target: "mdm.core", path = %path.display(), "no elevated rights; using user-mediated install");
            return match self.dispatch_handoff(path) {
                Ok(()) => {
                    session.state = SessionState::Succeeded;
                    Ok(InstallOutcome::HandedOff)
                }
                Err(reason) => {
                    session.state = SessionState::Failed(reason.clone());
                    Err(InstallError::HandoffFailed(reason))
                }
            };
        }

        match self.begin_privileged_install(path, &mut session) {
            Ok(rx) => {
                let signal = rx.await.map_err(|_| InstallError::ChannelClosed)?;
                if signal.status.is_success() {
                    session.state = SessionState::Succeeded;
                    info!(target: "mdm.core", path = %path.display(), "privileged install succeeded");
                    return Ok(InstallOutcome::Installed);
                }
                let rejection = PlatformRejection::from_signal(&signal);
                warn!(
                    target: "mdm.core",
                    path = %path.display(),
                    status = signal.status.code(),
                    error = %rejection,
                    "privileged install rejected; falling back"
                );
                self.fall_back(path, &mut session, rejection.to_string())
            }
            Err(setup_reason) => {
                warn!(
                    target: "mdm.core",
                    path = %path.display(),
                    error = %setup_reason,
                    "privileged install setup failed; falling back"
                );
                self.fall_back(path, &mut session, setup_reason)
            }
        }
    }

    /// Uninstalls the package identified by `package_id`.
    ///
    /// Privileged only: there is no unprivileged equivalent of a silent
    /// uninstall, so callers without rights fail immediately.
    pub async fn uninstall_package(&self, package_id: &str) -> Result<(), UninstallError> {
        if package_id.trim().is_empty() {
            return Err(UninstallError::Precondition(
                "package id must not be empty".to_string(),
            ));
        }
        if !self.oracle.has_elevated_rights() {
            return Err(UninstallError::NotPrivileged);
        }

        let mut session = Session::new(SessionKind::Uninstall, package_id);
        session.state = SessionState::Submitted;
        let (token, rx) = self
            .correlator
            .register(session.clone())
            .map_err(|err| UninstallError::Setup(err.to_string()))?;

        let delivery = self.probe.delivery_mode(SessionKind::Uninstall);
        if let Err(err) = self.platform.begin_uninstall(package_id, token, &delivery) {
            self.correlator.abandon(token);
            return Err(UninstallError::Setup(err.to_string()));
        }
        debug!(target: "mdm.core", %token, package_id, "uninstall session committed");

        let signal = rx.await.map_err(|_| UninstallError::ChannelClosed)?;
        if signal.status.is_success() {
            info!(target: "mdm.core", package_id, "uninstall succeeded");
            Ok(())
        } else {
            Err(UninstallError::Rejected(PlatformRejection::from_signal(
                &signal,
            )))
        }
    }

    /// Opens, streams, registers, and commits a privileged staging session.
    ///
    /// Any synchronous failure is returned as a reason string; a registered
    /// token is abandoned before returning so no bookkeeping leaks.
    fn begin_privileged_install(
        &self,
        path: &Path,
        session: &mut Session,
    ) -> Result<oneshot::Receiver<CompletionSignal>, String> {
        let staging = self
            .platform
            .open_staging_session()
            .map_err(|err| err.to_string())?;

        let mut source = File::open(path).map_err(|err| format!("open {}: {err}", path.display()))?;
        let mut buffer = [0u8; STAGING_CHUNK];
        loop {
            let read = source
                .read(&mut buffer)
                .map_err(|err| format!("read {}: {err}", path.display()))?;
            if read == 0 {
                break;
            }
            self.platform
                .write_staging(staging, "package", &buffer[..read])
                .map_err(|err| err.to_string())?;
        }

        session.state = SessionState::Submitted;
        let (token, rx) = self
            .correlator
            .register(session.clone())
            .map_err(|err| err.to_string())?;

        let delivery = self.probe.delivery_mode(SessionKind::Install);
        if let Err(err) = self.platform.commit_staging(staging, token, &delivery) {
            self.correlator.abandon(token);
            return Err(err.to_string());
        }

        session.state = SessionState::AwaitingCompletion;
        debug!(target: "mdm.core", %token, path = %path.display(), "install session committed");
        Ok(rx)
    }

    /// Unified fallback for both privileged failure modes: stage a private
    /// copy and dispatch the user-mediated installer. Terminal failure
    /// carries both strategies' reasons.
    fn fall_back(
        &self,
        path: &Path,
        session: &mut Session,
        privileged_reason: String,
    ) -> Result<InstallOutcome, InstallError> {
        session.state = SessionState::FallbackInProgress;
        match self.dispatch_handoff(path) {
            Ok(()) => {
                session.state = SessionState::Succeeded;
                info!(target: "mdm.core", path = %path.display(), "user-mediated install dispatched");
                Ok(InstallOutcome::HandedOff)
            }
            Err(fallback_reason) => {
                session.state = SessionState::Failed(fallback_reason.clone());
                Err(InstallError::StrategiesExhausted {
                    privileged: privileged_reason,
                    fallback: fallback_reason,
                })
            }
        }
    }

    fn dispatch_handoff(&self, path: &Path) -> Result<(), String> {
        let handoff = self
            .platform
            .stage_for_handoff(path)
            .map_err(|err| err.to_string())?;
        self.platform
            .dispatch_user_install(&handoff)
            .map_err(|err| err.to_string())
    }
}

/// Cheap integrity gate, not a cryptographic verification: the file must
/// exist, be readable, be non-empty, and carry the expected extension.
/// The archive is deliberately never opened or parsed here.
fn validate_install_source(path: &Path) -> Result<(), InstallError> {
    if path.as_os_str().is_empty() {
        return Err(InstallError::Precondition(
            "package path must not be empty".to_string(),
        ));
    }

    let metadata = std::fs::metadata(path).map_err(|err| {
        InstallError::Precondition(format!(
            "package file not found or unreadable: {}: {err}",
            path.display()
        ))
    })?;
    if !metadata.is_file() {
        return Err(InstallError::Precondition(format!(
            "package path is not a file: {}",
            path.display()
        )));
    }
    if metadata.len() == 0 {
        return Err(InstallError::Precondition(format!(
            "package file is empty: {}",
            path.display()
        )));
    }

    let extension_ok = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PAYLOAD_EXTENSION));
    if !extension_ok {
        return Err(InstallError::Precondition(format!(
            "unexpected package file type: {}",
            path.display()
        )));
    }

    // Readability check without parsing the payload.
    File::open(path).map_err(|err| {
        InstallError::Precondition(format!("package file unreadable: {}: {err}", path.display()))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use mdm_protocol::InstallStatus;
    use mdm_runtime::fake::FakePlatform;

    use super::*;

    fn write_payload(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    /// Forwards platform completion events to the correlator, standing in
    /// for the engine's completion pump.
    fn spawn_pump(platform: &Arc<FakePlatform>, correlator: &Arc<SessionCorrelator>) {
        let mut completions = platform.take_completions().unwrap();
        let correlator = Arc::clone(correlator);
        tokio::spawn(async move {
            while let Some(event) = completions.recv().await {
                correlator.resolve(event.token, event.signal);
            }
        });
    }

    fn orchestrator(
        platform: &Arc<FakePlatform>,
    ) -> (Orchestrator<FakePlatform>, Arc<SessionCorrelator>) {
        let correlator = Arc::new(SessionCorrelator::new());
        (
            Orchestrator::new(Arc::clone(platform), Arc::clone(&correlator)),
            correlator,
        )
    }

    #[tokio::test]
    async fn privileged_install_succeeds_silently() {
        let dir = tempfile::tempdir().unwrap();
        let payload = write_payload(&dir, "app.apk", b"payload-bytes");
        let platform = FakePlatform::privileged();
        let (orchestrator, correlator) = orchestrator(&platform);
        spawn_pump(&platform, &correlator);

        let outcome = orchestrator.install_package(&payload).await.unwrap();
        assert_eq!(outcome, InstallOutcome::Installed);
        assert_eq!(correlator.pending_count(), 0);

        let committed = platform.committed_sessions();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].bytes_written, b"payload-bytes".len());
        assert!(platform.dispatched_handoffs().is_empty());
    }

    #[tokio::test]
    async fn unprivileged_install_hands_off() {
        let dir = tempfile::tempdir().unwrap();
        let payload = write_payload(&dir, "app.apk", b"payload");
        let platform = FakePlatform::unprivileged();
        let (orchestrator, _correlator) = orchestrator(&platform);

        let outcome = orchestrator.install_package(&payload).await.unwrap();
        assert_eq!(outcome, InstallOutcome::HandedOff);
        assert!(platform.committed_sessions().is_empty());
        assert_eq!(platform.dispatched_handoffs().len(), 1);
    }

    #[tokio::test]
    async fn missing_payload_is_a_precondition_failure() {
        let platform = FakePlatform::privileged();
        let (orchestrator, correlator) = orchestrator(&platform);

        let err = orchestrator
            .install_package(Path::new("/nonexistent/app.apk"))
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::Precondition(_)));
        // No session registered, nothing staged.
        assert_eq!(correlator.pending_count(), 0);
        assert!(platform.committed_sessions().is_empty());
    }

    #[tokio::test]
    async fn empty_payload_is_a_precondition_failure() {
        let dir = tempfile::tempdir().unwrap();
        let payload = write_payload(&dir, "app.apk", b"");
        let platform = FakePlatform::privileged();
        let (orchestrator, _) = orchestrator(&platform);

        let err = orchestrator.install_package(&payload).await.unwrap_err();
        assert!(matches!(err, InstallError::Precondition(_)));
    }

    #[tokio::test]
    async fn wrong_extension_is_a_precondition_failure() {
        let dir = tempfile::tempdir().unwrap();
        let payload = write_payload(&dir, "app.zip", b"not-a-package");
        let platform = FakePlatform::privileged();
        let (orchestrator, _) = orchestrator(&platform);

        let err = orchestrator.install_package(&payload).await.unwrap_err();
        assert!(matches!(err, InstallError::Precondition(_)));
    }

    #[tokio::test]
    async fn commit_setup_failure_falls_back_to_handoff() {
        let dir = tempfile::tempdir().unwrap();
        let payload = write_payload(&dir, "app.apk", b"payload");
        let platform = FakePlatform::privileged();
        platform.fail_commit("staging daemon unavailable");
        let (orchestrator, correlator) = orchestrator(&platform);

        let outcome = orchestrator.install_package(&payload).await.unwrap();
        assert_eq!(outcome, InstallOutcome::HandedOff);
        assert_eq!(platform.dispatched_handoffs().len(), 1);
        // The abandoned registration must not leak.
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn async_rejection_falls_back_to_handoff() {
        let dir = tempfile::tempdir().unwrap();
        let payload = write_payload(&dir, "app.apk", b"payload");
        let platform = FakePlatform::privileged();
        platform.script_completion(InstallStatus::Conflict);
        let (orchestrator, correlator) = orchestrator(&platform);
        spawn_pump(&platform, &correlator);

        let outcome = orchestrator.install_package(&payload).await.unwrap();
        assert_eq!(outcome, InstallOutcome::HandedOff);
        assert_eq!(platform.committed_sessions().len(), 1);
        assert_eq!(platform.dispatched_handoffs().len(), 1);
    }

    #[tokio::test]
    async fn both_strategies_failing_reports_both_reasons() {
        let dir = tempfile::tempdir().unwrap();
        let payload = write_payload(&dir, "app.apk", b"payload");
        let platform = FakePlatform::privileged();
        platform.script_completion(InstallStatus::Blocked);
        platform.fail_handoff("no installer activity");
        let (orchestrator, correlator) = orchestrator(&platform);
        spawn_pump(&platform, &correlator);

        let err = orchestrator.install_package(&payload).await.unwrap_err();
        match err {
            InstallError::StrategiesExhausted { privileged, fallback } => {
                assert!(privileged.contains("blocked"), "privileged: {privileged}");
                assert!(fallback.contains("no installer activity"), "fallback: {fallback}");
            }
            other => panic!("expected StrategiesExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unprivileged_handoff_failure_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let payload = write_payload(&dir, "app.apk", b"payload");
        let platform = FakePlatform::unprivileged();
        platform.fail_handoff("dispatch refused");
        let (orchestrator, _) = orchestrator(&platform);

        let err = orchestrator.install_package(&payload).await.unwrap_err();
        assert!(matches!(err, InstallError::HandoffFailed(_)));
    }

    #[tokio::test]
    async fn privileged_uninstall_succeeds() {
        let platform = FakePlatform::privileged();
        let (orchestrator, correlator) = orchestrator(&platform);
        spawn_pump(&platform, &correlator);

        orchestrator.uninstall_package("com.example.app").await.unwrap();
        let begun = platform.begun_uninstalls();
        assert_eq!(begun.len(), 1);
        assert_eq!(begun[0].package_id, "com.example.app");
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn uninstall_without_rights_has_no_fallback() {
        let platform = FakePlatform::unprivileged();
        let (orchestrator, _) = orchestrator(&platform);

        let err = orchestrator.uninstall_package("com.example.app").await.unwrap_err();
        assert_eq!(err, UninstallError::NotPrivileged);
        assert!(platform.begun_uninstalls().is_empty());
    }

    #[tokio::test]
    async fn uninstall_rejection_surfaces_taxonomy() {
        let platform = FakePlatform::privileged();
        platform.script_completion(InstallStatus::Blocked);
        let (orchestrator, correlator) = orchestrator(&platform);
        spawn_pump(&platform, &correlator);

        let err = orchestrator.uninstall_package("com.example.app").await.unwrap_err();
        assert_eq!(err, UninstallError::Rejected(PlatformRejection::Blocked));
    }

    #[tokio::test]
    async fn empty_uninstall_id_is_a_precondition_failure() {
        let platform = FakePlatform::privileged();
        let (orchestrator, _) = orchestrator(&platform);
        let err = orchestrator.uninstall_package("  ").await.unwrap_err();
        assert!(matches!(err, UninstallError::Precondition(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_installs_resolve_independently() {
        let dir = tempfile::tempdir().unwrap();
        let platform = FakePlatform::privileged();
        let (orchestrator, correlator) = orchestrator(&platform);
        let orchestrator = Arc::new(orchestrator);
        spawn_pump(&platform, &correlator);

        let mut handles = Vec::new();
        for index in 0..4 {
            let payload = write_payload(&dir, &format!("app-{index}.apk"), b"payload");
            let orchestrator = Arc::clone(&orchestrator);
            handles.push(tokio::spawn(async move {
                orchestrator.install_package(&payload).await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), InstallOutcome::Installed);
        }
        assert_eq!(correlator.pending_count(), 0);
        assert_eq!(platform.committed_sessions().len(), 4);
    }
}
