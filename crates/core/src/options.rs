//! Connector construction options.

use sequence_protocol::ChainId;
use serde::{Deserialize, Serialize};

/// Label shown by the wallet when no application name is configured.
pub const DEFAULT_APP_NAME: &str = "app";

/// Options a [`SequenceConnector`](crate::SequenceConnector) is built from.
///
/// Deserializes from `{"chainId": 137, "appName": "demo"}`; `appName` is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorOptions {
	/// Requested chain. Zero lets the hosted session pick its default network.
	pub chain_id: ChainId,
	#[serde(default = "default_app_name")]
	pub app_name: String,
}

fn default_app_name() -> String {
	DEFAULT_APP_NAME.to_string()
}

impl ConnectorOptions {
	pub fn new(chain_id: impl Into<ChainId>) -> Self {
		Self {
			chain_id: chain_id.into(),
			app_name: default_app_name(),
		}
	}

	/// Sets the application label; an empty name keeps the default.
	pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
		self.app_name = app_name.into();
		self.normalized()
	}

	/// Replaces an empty application name with [`DEFAULT_APP_NAME`].
	pub fn normalized(mut self) -> Self {
		if self.app_name.trim().is_empty() {
			self.app_name = default_app_name();
		}
		self
	}
}
