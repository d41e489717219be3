use mdm::{InstallError, PolicyError, UninstallError};
use thiserror::Error;

use crate::output::model::ErrorCode;

/// Command-level failure, carrying enough to build the error envelope.
#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Install(#[from] InstallError),

	#[error(transparent)]
	Uninstall(#[from] UninstallError),

	#[error(transparent)]
	Policy(#[from] PolicyError),

	#[error("invalid input: {0}")]
	InvalidInput(String),

	/// Every requested restriction was unsupported.
	#[error("{0}")]
	Unsupported(String),

	/// A restriction batch failed with nothing applied or cleared.
	#[error("restriction batch failed: {0}")]
	BatchFailed(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl CliError {
	/// The stable machine-readable code reported in the envelope.
	pub fn code(&self) -> ErrorCode {
		match self {
			CliError::Install(err) => match err {
				InstallError::Precondition(_) => ErrorCode::Precondition,
				InstallError::StrategiesExhausted { .. } | InstallError::HandoffFailed(_) => {
					ErrorCode::PlatformRejected
				}
				InstallError::ChannelClosed => ErrorCode::InternalError,
			},
			CliError::Uninstall(err) => match err {
				UninstallError::Precondition(_) => ErrorCode::Precondition,
				UninstallError::NotPrivileged => ErrorCode::NotPrivileged,
				UninstallError::Setup(_) | UninstallError::Rejected(_) => ErrorCode::PlatformRejected,
				UninstallError::ChannelClosed => ErrorCode::InternalError,
			},
			CliError::Policy(err) => match err {
				PolicyError::NotPrivileged => ErrorCode::NotPrivileged,
				PolicyError::InvalidInput(_) => ErrorCode::InvalidInput,
				PolicyError::Platform(_) => ErrorCode::PlatformRejected,
			},
			CliError::InvalidInput(_) => ErrorCode::InvalidInput,
			CliError::Unsupported(_) => ErrorCode::Unsupported,
			CliError::BatchFailed(_) => ErrorCode::PlatformRejected,
			CliError::Io(_) => ErrorCode::IoError,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn codes_match_error_classes() {
		let err = CliError::from(InstallError::Precondition("missing".to_string()));
		assert_eq!(err.code(), ErrorCode::Precondition);

		let err = CliError::from(UninstallError::NotPrivileged);
		assert_eq!(err.code(), ErrorCode::NotPrivileged);

		let err = CliError::from(PolicyError::Platform("rejected".to_string()));
		assert_eq!(err.code(), ErrorCode::PlatformRejected);

		let err = CliError::InvalidInput("NAME=maybe".to_string());
		assert_eq!(err.code(), ErrorCode::InvalidInput);
	}
}
