use mdm::DeviceEngine;
use mdm_runtime::Platform;
use serde_json::json;

use super::CommandOutcome;

pub fn lock<P: Platform>(engine: &DeviceEngine<P>) -> CommandOutcome {
	engine.lock_device()?;
	Ok(json!({ "locked": true }))
}

pub fn wipe<P: Platform>(engine: &DeviceEngine<P>) -> CommandOutcome {
	engine.wipe_data()?;
	Ok(json!({ "wiped": true }))
}

pub fn disable<P: Platform>(engine: &DeviceEngine<P>, package: &str) -> CommandOutcome {
	engine.disable_app(package)?;
	Ok(json!({ "package": package, "disabled": true }))
}

pub fn elevate<P: Platform>(engine: &DeviceEngine<P>, explanation: &str) -> CommandOutcome {
	engine.request_elevation(explanation)?;
	Ok(json!({ "dispatched": true }))
}
