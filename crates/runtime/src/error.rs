//! Error types for connector collaborators.

use sequence_protocol::ChainIdError;
use thiserror::Error;

/// Result type alias for provider, session and connector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// EIP-1193 code for a request the user declined.
pub const USER_REJECTED_REQUEST: i64 = 4001;
/// EIP-1193 code for a method the provider does not implement.
pub const UNSUPPORTED_METHOD: i64 = 4200;

/// Errors surfaced by providers, hosted sessions and the connector.
#[derive(Debug, Error)]
pub enum Error {
	/// Hosted wallet session did not report a connection after `connect`.
	#[error("Failed to connect: {0}")]
	ConnectionFailed(String),

	/// A provider or session call was rejected.
	#[error("{method} failed: {message}{}", code.map(|c| format!(" (code {c})")).unwrap_or_default())]
	ProviderRequestFailed {
		/// RPC method or session operation that failed.
		method: String,
		/// Human-readable reason reported by the collaborator.
		message: String,
		/// EIP-1193 error code, when the collaborator supplied one.
		code: Option<i64>,
	},

	/// Chain id string was not valid base-16.
	#[error(transparent)]
	InvalidChainId(#[from] ChainIdError),

	/// Provider response did not have the expected shape.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// `activate` was called on a connector that is already active.
	#[error("Connector is already active")]
	AlreadyActive,

	/// Another activate or deactivate call has not finished yet.
	#[error("Connector transition in progress: {0}")]
	TransitionInProgress(&'static str),

	/// Timeout waiting for a connector event.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// Event channel closed unexpectedly.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,
}

impl Error {
	/// Builds a rejected-request error for `method`.
	pub fn request_failed(method: impl Into<String>, message: impl Into<String>, code: Option<i64>) -> Self {
		Error::ProviderRequestFailed {
			method: method.into(),
			message: message.into(),
			code,
		}
	}

	/// Returns the EIP-1193 code if this is a rejected request.
	pub fn code(&self) -> Option<i64> {
		match self {
			Error::ProviderRequestFailed { code, .. } => *code,
			_ => None,
		}
	}

	/// Returns true if the user declined the request in their wallet.
	pub fn is_user_rejection(&self) -> bool {
		self.code() == Some(USER_REJECTED_REQUEST)
	}

	/// Returns true if this error was caused by overlapping state transitions.
	pub fn is_transition_conflict(&self) -> bool {
		matches!(self, Error::AlreadyActive | Error::TransitionInProgress(_))
	}
}
