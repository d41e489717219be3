//! Privilege oracle: does the caller hold owner-level rights right now?

use std::sync::Arc;

use mdm_runtime::{OwnerState, Platform};
use tracing::warn;

/// Pure query over the platform's owner state. No side effects.
pub struct PrivilegeOracle<P: Platform> {
    platform: Arc<P>,
}

impl<P: Platform> PrivilegeOracle<P> {
    pub fn new(platform: Arc<P>) -> Self {
        Self { platform }
    }

    /// True only when the platform positively reports owner rights.
    ///
    /// A failed underlying query reports `Unknown`, which is treated as
    /// not privileged: the engine never assumes elevated rights on doubt.
    pub fn has_elevated_rights(&self) -> bool {
        match self.platform.owner_state() {
            OwnerState::Owner => true,
            OwnerState::NotOwner => false,
            OwnerState::Unknown => {
                warn!(target: "mdm.core", "owner-state query inconclusive; assuming unprivileged");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mdm_runtime::fake::FakePlatform;

    use super::*;

    #[test]
    fn owner_is_privileged() {
        let oracle = PrivilegeOracle::new(FakePlatform::privileged());
        assert!(oracle.has_elevated_rights());
    }

    #[test]
    fn non_owner_is_not_privileged() {
        let oracle = PrivilegeOracle::new(FakePlatform::unprivileged());
        assert!(!oracle.has_elevated_rights());
    }

    #[test]
    fn unknown_owner_state_is_not_privileged() {
        let platform = FakePlatform::privileged();
        platform.set_owner(OwnerState::Unknown);
        let oracle = PrivilegeOracle::new(platform);
        assert!(!oracle.has_elevated_rights());
    }
}
