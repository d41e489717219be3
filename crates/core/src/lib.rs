// mdm: device-management engine.
//
// Orchestrates asynchronous install/uninstall sessions against a platform
// boundary and applies batch restriction policy with partial-failure
// reporting. The platform itself lives behind the `mdm_runtime::Platform`
// trait; wire types live in `mdm_protocol`.

pub mod capability;
pub mod correlator;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod privilege;
pub mod restrictions;
pub mod session;

pub use capability::CapabilityProbe;
pub use correlator::{CorrelatorError, SessionCorrelator};
pub use engine::DeviceEngine;
pub use error::{InstallError, PlatformRejection, PolicyError, UninstallError};
pub use orchestrator::Orchestrator;
pub use privilege::PrivilegeOracle;
pub use restrictions::{KNOWN_RESTRICTIONS, PolicyEngine, RestrictionChange};
pub use session::{Session, SessionState};
