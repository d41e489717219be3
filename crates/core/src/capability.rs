//! Capability probe: version-gated platform behavior in one place.
//!
//! Every `if version >= X` decision in the system lives here as a pure,
//! table-driven lookup, so version-skew bugs have a single place to be
//! fixed and tested.

use mdm_protocol::SessionKind;
use mdm_runtime::{DeliveryMode, IntentMutability};

/// Version where completion-intent mutability became mandatory to declare.
const VERSION_SEALED_INTENTS: u32 = 31;
/// Version where completion receivers can be scoped to the owning package.
const VERSION_SCOPED_RECEIVERS: u32 = 33;
/// Version where device location can be forced on by the owner.
const VERSION_FORCED_LOCATION: u32 = 28;
/// Version where the status bar can be disabled by the owner.
const VERSION_STATUS_BAR_CONTROL: u32 = 24;

/// Pure function of the host platform version.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityProbe {
    version: u32,
}

impl CapabilityProbe {
    pub fn new(version: u32) -> Self {
        Self { version }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Selects how a completion signal may be delivered for `kind`.
    ///
    /// From the sealed-intents version on, install completions must be
    /// mutable (the platform annotates them with the final status) while
    /// uninstall completions must be immutable. Before that, mutability is
    /// unconstrained. Receiver scoping applies from its own version on.
    pub fn delivery_mode(&self, kind: SessionKind) -> DeliveryMode {
        let mutability = if self.version >= VERSION_SEALED_INTENTS {
            match kind {
                SessionKind::Install => IntentMutability::Mutable,
                SessionKind::Uninstall => IntentMutability::Immutable,
            }
        } else {
            IntentMutability::Unconstrained
        };

        DeliveryMode {
            update_current: true,
            mutability,
            scoped_receiver: self.version >= VERSION_SCOPED_RECEIVERS,
        }
    }

    pub fn supports_forced_location(&self) -> bool {
        self.version >= VERSION_FORCED_LOCATION
    }

    pub fn supports_status_bar_control(&self) -> bool {
        self.version >= VERSION_STATUS_BAR_CONTROL
    }

    pub fn supports_package_suspension(&self) -> bool {
        self.version >= VERSION_STATUS_BAR_CONTROL
    }
}
