use std::path::Path;

use mdm::DeviceEngine;
use mdm_runtime::Platform;
use serde_json::json;

use super::CommandOutcome;

pub async fn execute<P: Platform>(engine: &DeviceEngine<P>, path: &Path) -> CommandOutcome {
	let outcome = engine.install_package(path).await?;
	Ok(json!({
		"path": path.display().to_string(),
		"outcome": outcome,
	}))
}
