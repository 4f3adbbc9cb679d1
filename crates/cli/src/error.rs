use std::path::PathBuf;

use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("failed to read scenario {path}")]
	ScenarioRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid scenario {path}: {source}")]
	ScenarioParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid scenario: {0}")]
	InvalidScenario(#[source] anyhow::Error),

	#[error("invalid argument: {0}")]
	InvalidArgument(String),

	#[error(transparent)]
	Connector(#[from] sequence::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl CliError {
	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let (code, details) = match self {
			CliError::ScenarioRead { path, .. } => (ErrorCode::IoError, Some(serde_json::json!({ "path": path }))),
			CliError::ScenarioParse { path, source } => (
				ErrorCode::InvalidInput,
				Some(serde_json::json!({ "path": path, "line": source.line(), "column": source.column() })),
			),
			CliError::InvalidScenario(_) | CliError::InvalidArgument(_) => (ErrorCode::InvalidInput, None),
			CliError::Connector(err) => classify_connector_error(err),
			CliError::Io(_) => (ErrorCode::IoError, None),
			CliError::Json(_) => (ErrorCode::InternalError, None),
		};

		CommandError {
			code,
			message: self.to_string(),
			details,
		}
	}
}

fn classify_connector_error(err: &sequence::Error) -> (ErrorCode, Option<serde_json::Value>) {
	use sequence::Error;

	match err {
		Error::ConnectionFailed(_) => (ErrorCode::ConnectionFailed, None),
		Error::InvalidChainId(_) => (ErrorCode::InvalidChainId, None),
		Error::AlreadyActive | Error::TransitionInProgress(_) => (ErrorCode::TransitionConflict, None),
		Error::ProviderRequestFailed { method, code, .. } => {
			let details = serde_json::json!({ "method": method, "rpcCode": code });
			if err.is_user_rejection() {
				(ErrorCode::UserRejected, Some(details))
			} else {
				(ErrorCode::ProviderError, Some(details))
			}
		}
		_ => (ErrorCode::InternalError, None),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_rejection_is_classified() {
		let err = CliError::from(sequence::Error::request_failed("eth_requestAccounts", "User rejected", Some(4001)));
		let command_error = err.to_command_error();
		assert_eq!(command_error.code, ErrorCode::UserRejected);
		assert_eq!(command_error.details.unwrap()["rpcCode"], 4001);
	}

	#[test]
	fn other_rpc_failures_are_provider_errors() {
		let err = CliError::from(sequence::Error::request_failed("eth_chainId", "boom", None));
		assert_eq!(err.to_command_error().code, ErrorCode::ProviderError);
	}

	#[test]
	fn overlapping_transitions_are_conflicts() {
		let err = CliError::from(sequence::Error::AlreadyActive);
		assert_eq!(err.to_command_error().code, ErrorCode::TransitionConflict);
	}

	#[test]
	fn parse_errors_carry_location() {
		let source = serde_json::from_str::<serde_json::Value>("{\n  nope").unwrap_err();
		let err = CliError::ScenarioParse {
			path: PathBuf::from("s.json"),
			source,
		};
		let command_error = err.to_command_error();
		assert_eq!(command_error.code, ErrorCode::InvalidInput);
		assert_eq!(command_error.details.unwrap()["line"], 2);
	}
}
