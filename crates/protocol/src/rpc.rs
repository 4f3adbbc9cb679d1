//! JSON-RPC request shapes used against wallet providers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prompts the wallet to expose its accounts to the caller.
pub const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
/// Returns the provider's current chain id, usually as a hex string.
pub const ETH_CHAIN_ID: &str = "eth_chainId";
/// Returns the accounts currently exposed to the caller.
pub const ETH_ACCOUNTS: &str = "eth_accounts";

/// Arguments of an EIP-1193 `request` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestArguments {
	pub method: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub params: Option<Value>,
}

impl RequestArguments {
	/// Builds a request without parameters.
	pub fn new(method: impl Into<String>) -> Self {
		Self {
			method: method.into(),
			params: None,
		}
	}
}
