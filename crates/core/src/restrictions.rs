//! Restriction policy engine.
//!
//! Applies a batch of named restriction changes with partial-failure
//! semantics: each name is processed independently, failures are collected
//! rather than aborting the batch, and the reported outcome accounts for
//! every requested name exactly once (applied, cleared, skipped as already
//! in the desired state, or errored).

use std::collections::BTreeMap;
use std::sync::Arc;

use mdm_protocol::CompositeResult;
use mdm_runtime::Platform;
use tracing::{debug, info, warn};

use crate::capability::CapabilityProbe;
use crate::error::PolicyError;
use crate::privilege::PrivilegeOracle;

/// Restriction names the engine recognizes. Anything else in a batch is
/// reported as unsupported, never forwarded to the platform.
pub const KNOWN_RESTRICTIONS: [&str; 7] = [
    "DISALLOW_CONFIG_WIFI",
    "DISALLOW_INSTALL_APPS",
    "DISALLOW_UNINSTALL_APPS",
    "DISALLOW_MODIFY_ACCOUNTS",
    "DISALLOW_CONFIG_MOBILE_NETWORKS",
    "DISALLOW_FACTORY_RESET",
    "DISALLOW_CONFIG_LOCATION",
];

const RESTRICTION_FORCED_LOCATION: &str = "DISALLOW_CONFIG_LOCATION";

/// The surface users would otherwise use to revert restrictions by hand.
const SETTINGS_SURFACE: &str = "com.android.settings";

/// One requested change in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionChange {
    pub name: String,
    pub active: bool,
}

impl RestrictionChange {
    pub fn new(name: impl Into<String>, active: bool) -> Self {
        Self {
            name: name.into(),
            active,
        }
    }
}

/// Batch restriction applier with settings-surface side effects.
pub struct PolicyEngine<P: Platform> {
    platform: Arc<P>,
    oracle: PrivilegeOracle<P>,
    probe: CapabilityProbe,
}

impl<P: Platform> PolicyEngine<P> {
    pub fn new(platform: Arc<P>) -> Self {
        let probe = CapabilityProbe::new(platform.platform_version());
        Self {
            oracle: PrivilegeOracle::new(Arc::clone(&platform)),
            platform,
            probe,
        }
    }

    /// Applies `changes` as one batch.
    ///
    /// Fails outright only when the caller holds no elevated rights or the
    /// pre-batch state snapshot cannot be read. Per-name failures land in
    /// the result's error list; names already in the requested state are
    /// skipped and appear in neither the applied nor the cleared list.
    pub fn apply_batch(&self, changes: &[RestrictionChange]) -> Result<CompositeResult, PolicyError> {
        if !self.oracle.has_elevated_rights() {
            return Err(PolicyError::NotPrivileged);
        }

        let prior = self.platform.active_restrictions()?;
        let mut result = CompositeResult::default();

        for change in changes {
            let name = change.name.as_str();
            if !KNOWN_RESTRICTIONS.contains(&name) {
                warn!(target: "mdm.policy", name, "unsupported restriction requested");
                result.errors.push(format!("unsupported restriction: {name}"));
                continue;
            }
            if prior.contains(name) == change.active {
                debug!(target: "mdm.policy", name, active = change.active, "restriction already in desired state");
                continue;
            }

            let outcome = if change.active {
                self.platform.add_restriction(name)
            } else {
                self.platform.clear_restriction(name)
            };
            match outcome {
                Ok(()) => {
                    if change.active {
                        result.applied_names.push(name.to_string());
                        if name == RESTRICTION_FORCED_LOCATION {
                            self.force_location_on(&mut result);
                        }
                    } else {
                        result.cleared_names.push(name.to_string());
                    }
                }
                Err(err) => {
                    warn!(target: "mdm.policy", name, error = %err, "restriction change rejected");
                    result.errors.push(format!("failed to process {name}: {err}"));
                }
            }
        }

        self.sync_settings_surface(&mut result);

        // Re-read so callers see the device's actual post-batch state, not
        // an inference from the deltas above.
        match self.platform.active_restrictions() {
            Ok(active) => {
                result.current_status = KNOWN_RESTRICTIONS
                    .iter()
                    .map(|name| (name.to_string(), active.contains(*name)))
                    .collect::<BTreeMap<_, _>>();
            }
            Err(err) => {
                result
                    .errors
                    .push(format!("failed to read restriction status: {err}"));
            }
        }

        info!(
            target: "mdm.policy",
            applied = result.applied_names.len(),
            cleared = result.cleared_names.len(),
            errors = result.errors.len(),
            "restriction batch processed"
        );
        Ok(result)
    }

    /// Locking down location configuration also forces location on, so the
    /// policy cannot freeze the device into a location-off state.
    fn force_location_on(&self, result: &mut CompositeResult) {
        if !self.probe.supports_forced_location() {
            debug!(target: "mdm.policy", "platform too old to force location on");
            return;
        }
        if let Err(err) = self.platform.set_location_enabled(true) {
            result
                .errors
                .push(format!("failed to force location on: {err}"));
        }
    }

    /// Hides and suspends the settings surface while any known restriction
    /// is active, and restores it once none are. Users must not be able to
    /// walk into settings and undo active policy.
    fn sync_settings_surface(&self, result: &mut CompositeResult) {
        let any_active = match self.platform.active_restrictions() {
            Ok(active) => KNOWN_RESTRICTIONS.iter().any(|name| active.contains(*name)),
            Err(err) => {
                result
                    .errors
                    .push(format!("failed to read restriction status: {err}"));
                return;
            }
        };

        if let Err(err) = self.platform.set_app_hidden(SETTINGS_SURFACE, any_active) {
            result
                .errors
                .push(format!("failed to update settings surface: {err}"));
        }
        if self.probe.supports_package_suspension() {
            if let Err(err) = self
                .platform
                .set_packages_suspended(&[SETTINGS_SURFACE], any_active)
            {
                result
                    .errors
                    .push(format!("failed to update settings surface: {err}"));
            }
        }
        if self.probe.supports_status_bar_control() {
            if let Err(err) = self.platform.set_status_bar_disabled(any_active) {
                result
                    .errors
                    .push(format!("failed to update status bar: {err}"));
            }
        }
    }
}
