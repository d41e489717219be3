use std::io::{self, Write};
use std::time::Instant;

use serde::Serialize;

use crate::output::format::OutputFormat;
use crate::output::model::{CommandError, CommandResult, ErrorCode, SCHEMA_VERSION};

/// Builder for constructing command results.
pub struct ResultBuilder<T: Serialize> {
	schema_version: Option<u32>,
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	start_time: Instant,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			schema_version: Some(SCHEMA_VERSION),
			command: command.into(),
			data: None,
			error: None,
			start_time: Instant::now(),
		}
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	pub fn error(mut self, code: ErrorCode, message: impl Into<String>) -> Self {
		self.error = Some(CommandError {
			code,
			message: message.into(),
		});
		self
	}

	pub fn build(self) -> CommandResult<T> {
		let ok = self.error.is_none() && self.data.is_some();
		CommandResult {
			schema_version: self.schema_version,
			ok,
			command: self.command,
			data: self.data,
			error: self.error,
			duration_ms: Some(self.start_time.elapsed().as_millis() as u64),
		}
	}
}

/// Print a command result to stdout in the specified format.
pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => print_result_text(result),
	}
}

fn print_result_text<T: Serialize>(result: &CommandResult<T>) {
	let mut stdout = io::stdout().lock();

	if result.ok {
		if let Some(ref data) = result.data {
			if let Ok(json) = serde_json::to_string_pretty(data) {
				let _ = writeln!(stdout, "{json}");
			}
		}
	} else if let Some(ref error) = result.error {
		let _ = writeln!(stdout, "Error [{}]: {}", error.code, error.message);
	}

	if let Some(duration_ms) = result.duration_ms {
		let _ = writeln!(stdout, "Completed in {duration_ms}ms");
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ok_requires_data_and_no_error() {
		let result: CommandResult<u32> = ResultBuilder::new("privilege").data(1).build();
		assert!(result.ok);
		assert_eq!(result.schema_version, Some(SCHEMA_VERSION));

		let result: CommandResult<u32> = ResultBuilder::new("privilege")
			.error(ErrorCode::NotPrivileged, "caller does not hold elevated rights")
			.build();
		assert!(!result.ok);
		assert_eq!(result.error.as_ref().map(|e| e.code), Some(ErrorCode::NotPrivileged));
	}

	#[test]
	fn envelope_serializes_camel_case_with_screaming_codes() {
		let result: CommandResult<()> = ResultBuilder::new("lock")
			.error(ErrorCode::PlatformRejected, "nope")
			.build();
		let value = serde_json::to_value(&result).unwrap();
		assert_eq!(value["schemaVersion"], SCHEMA_VERSION);
		assert_eq!(value["ok"], false);
		assert_eq!(value["error"]["code"], "PLATFORM_REJECTED");
		assert!(value["durationMs"].is_u64());
	}
}
