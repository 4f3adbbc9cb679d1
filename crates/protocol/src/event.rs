//! Provider event names and payloads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::chain::RawChainId;

/// Event names a connector listens for on an active provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderEventKind {
	ChainChanged,
	/// Legacy spelling of [`ChainChanged`](Self::ChainChanged) still emitted by older providers.
	NetworkChanged,
	AccountsChanged,
	Close,
}

impl ProviderEventKind {
	/// Every kind, in the order listeners are registered.
	pub const ALL: [ProviderEventKind; 4] = [
		ProviderEventKind::ChainChanged,
		ProviderEventKind::AccountsChanged,
		ProviderEventKind::Close,
		ProviderEventKind::NetworkChanged,
	];

	/// Returns the EIP-1193 event name.
	pub fn as_str(self) -> &'static str {
		match self {
			ProviderEventKind::ChainChanged => "chainChanged",
			ProviderEventKind::NetworkChanged => "networkChanged",
			ProviderEventKind::AccountsChanged => "accountsChanged",
			ProviderEventKind::Close => "close",
		}
	}
}

impl fmt::Display for ProviderEventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ProviderEventKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"chainChanged" => Ok(ProviderEventKind::ChainChanged),
			"networkChanged" => Ok(ProviderEventKind::NetworkChanged),
			"accountsChanged" => Ok(ProviderEventKind::AccountsChanged),
			"close" => Ok(ProviderEventKind::Close),
			_ => Err(format!("unknown provider event: {s}")),
		}
	}
}

/// Event delivered by a provider, with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ProviderEvent {
	ChainChanged(RawChainId),
	NetworkChanged(RawChainId),
	AccountsChanged(Vec<String>),
	Close,
}

impl ProviderEvent {
	/// Returns the name this event is dispatched under.
	pub fn kind(&self) -> ProviderEventKind {
		match self {
			ProviderEvent::ChainChanged(_) => ProviderEventKind::ChainChanged,
			ProviderEvent::NetworkChanged(_) => ProviderEventKind::NetworkChanged,
			ProviderEvent::AccountsChanged(_) => ProviderEventKind::AccountsChanged,
			ProviderEvent::Close => ProviderEventKind::Close,
		}
	}
}
