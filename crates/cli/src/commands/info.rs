use mdm::DeviceEngine;
use mdm_runtime::Platform;
use serde_json::json;

use super::CommandOutcome;

pub fn privilege<P: Platform>(engine: &DeviceEngine<P>) -> CommandOutcome {
	Ok(json!({ "privileged": engine.is_privileged() }))
}

pub fn sdk_version<P: Platform>(engine: &DeviceEngine<P>) -> CommandOutcome {
	Ok(json!({ "version": engine.platform_version() }))
}
