use mdm::DeviceEngine;
use mdm_runtime::Platform;
use serde_json::json;

use super::CommandOutcome;

pub async fn execute<P: Platform>(engine: &DeviceEngine<P>, package: &str) -> CommandOutcome {
	engine.uninstall_package(package).await?;
	Ok(json!({ "package": package, "uninstalled": true }))
}
