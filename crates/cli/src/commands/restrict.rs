use mdm::{DeviceEngine, RestrictionChange};
use mdm_protocol::CompositeResult;
use mdm_runtime::Platform;
use serde_json::json;

use super::CommandOutcome;
use crate::error::CliError;

pub fn execute<P: Platform>(engine: &DeviceEngine<P>, changes: &[String]) -> CommandOutcome {
	let changes = changes
		.iter()
		.map(|raw| parse_change(raw))
		.collect::<Result<Vec<_>, _>>()?;
	finish(engine.apply_restrictions(&changes)?)
}

pub fn baseline<P: Platform>(engine: &DeviceEngine<P>) -> CommandOutcome {
	finish(engine.apply_baseline()?)
}

/// Partial success is still success: the envelope data carries the per-name
/// errors. The command fails only when nothing was applied or cleared.
fn finish(result: CompositeResult) -> CommandOutcome {
	if result.errors.is_empty() || result.partially_succeeded() {
		return Ok(json!(result));
	}
	let message = result.errors.join("; ");
	if result
		.errors
		.iter()
		.all(|err| err.starts_with("unsupported restriction:"))
	{
		Err(CliError::Unsupported(message))
	} else {
		Err(CliError::BatchFailed(message))
	}
}

fn parse_change(raw: &str) -> Result<RestrictionChange, CliError> {
	let Some((name, value)) = raw.split_once('=') else {
		return Err(CliError::InvalidInput(format!(
			"expected NAME=true or NAME=false, got {raw}"
		)));
	};
	let active = match value {
		"true" => true,
		"false" => false,
		_ => {
			return Err(CliError::InvalidInput(format!(
				"expected true or false for {name}, got {value}"
			)));
		}
	};
	Ok(RestrictionChange::new(name, active))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_name_value_pairs() {
		let change = parse_change("DISALLOW_CONFIG_WIFI=true").unwrap();
		assert_eq!(change.name, "DISALLOW_CONFIG_WIFI");
		assert!(change.active);

		let change = parse_change("DISALLOW_FACTORY_RESET=false").unwrap();
		assert!(!change.active);

		assert!(parse_change("DISALLOW_CONFIG_WIFI").is_err());
		assert!(parse_change("DISALLOW_CONFIG_WIFI=yes").is_err());
	}

	#[test]
	fn all_unsupported_batch_fails_with_unsupported() {
		let result = CompositeResult {
			errors: vec!["unsupported restriction: DISALLOW_NOPE".to_string()],
			..Default::default()
		};
		match finish(result) {
			Err(CliError::Unsupported(message)) => assert!(message.contains("DISALLOW_NOPE")),
			other => panic!("expected Unsupported, got {other:?}"),
		}
	}

	#[test]
	fn partial_success_keeps_the_batch_ok() {
		let result = CompositeResult {
			applied_names: vec!["DISALLOW_CONFIG_WIFI".to_string()],
			errors: vec!["failed to process DISALLOW_FACTORY_RESET: rejected".to_string()],
			..Default::default()
		};
		let value = finish(result).unwrap();
		assert_eq!(value["appliedNames"][0], "DISALLOW_CONFIG_WIFI");
		assert_eq!(value["errors"].as_array().unwrap().len(), 1);
	}
}
