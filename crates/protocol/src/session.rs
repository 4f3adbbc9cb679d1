//! Hosted wallet session handshake types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options passed to a hosted session's `connect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
	/// Label the wallet shows to the user when asking for approval.
	pub app: String,
	/// Requests a signed authorization proof along with the connection.
	pub authorize: bool,
}

/// Result of a hosted session's `connect`.
///
/// Only `connected` is interpreted; anything else the wallet returns is kept
/// in `extra` for the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectDetails {
	pub connected: bool,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl ConnectDetails {
	pub fn connected() -> Self {
		Self {
			connected: true,
			extra: Map::new(),
		}
	}

	pub fn rejected() -> Self {
		Self::default()
	}
}
