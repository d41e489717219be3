//! Request/response shapes for the UI bridge surface.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A command issued by the bridge. Immutable once issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeRequest {
    GetPrivilegeLevel,
    GetPlatformVersion,
    InstallPackage { path: String },
    UninstallPackage { package_id: String },
    ApplyRestrictions { restrictions: BTreeMap<String, bool> },
    DisableApp { package_id: String },
    LockDevice,
    WipeData,
    RequestElevation { explanation: String },
}

impl BridgeRequest {
    /// Bridge method name, as exposed to the presentation layer.
    pub fn method(&self) -> &'static str {
        match self {
            BridgeRequest::GetPrivilegeLevel => "getPrivilegeLevel",
            BridgeRequest::GetPlatformVersion => "getPlatformVersion",
            BridgeRequest::InstallPackage { .. } => "installPackage",
            BridgeRequest::UninstallPackage { .. } => "uninstallPackage",
            BridgeRequest::ApplyRestrictions { .. } => "applyRestrictions",
            BridgeRequest::DisableApp { .. } => "disableApp",
            BridgeRequest::LockDevice => "lockDevice",
            BridgeRequest::WipeData => "wipeData",
            BridgeRequest::RequestElevation { .. } => "requestElevation",
        }
    }
}

/// How an install request was ultimately satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallOutcome {
    /// The privileged strategy committed and the platform reported success.
    Installed,
    /// The unprivileged strategy dispatched the user-mediated installer.
    /// Orchestration succeeded; end-user approval is outside the engine.
    HandedOff,
}

/// The terminal artifact of a restriction batch. Immutable once produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeResult {
    /// Names newly toggled on by this batch.
    pub applied_names: Vec<String>,
    /// Names newly toggled off by this batch.
    pub cleared_names: Vec<String>,
    /// Per-name and auxiliary failures, in processing order.
    pub errors: Vec<String>,
    /// Effective state of every known restriction after the batch.
    pub current_status: BTreeMap<String, bool>,
}

impl CompositeResult {
    /// True when every requested record succeeded.
    pub fn fully_succeeded(&self) -> bool {
        self.errors.is_empty()
    }

    /// True when some records succeeded and some failed.
    pub fn partially_succeeded(&self) -> bool {
        !self.errors.is_empty() && !(self.applied_names.is_empty() && self.cleared_names.is_empty())
    }
}
