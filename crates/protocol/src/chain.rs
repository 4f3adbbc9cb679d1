//! Chain identifiers and their wire representations.
//!
//! Providers report chain ids either as JSON numbers or as base-16 strings
//! (`"0x89"`). [`RawChainId`] captures both shapes; [`RawChainId::normalize`]
//! turns either into a [`ChainId`] the moment it is received.

use std::fmt;
use std::num::ParseIntError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Integer identifier of an EVM network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
	pub const MAINNET: ChainId = ChainId(1);
	pub const RINKEBY: ChainId = ChainId(4);
	pub const GOERLI: ChainId = ChainId(5);
	pub const POLYGON: ChainId = ChainId(137);

	/// Returns the numeric value.
	pub const fn get(self) -> u64 {
		self.0
	}

	/// Returns `true` for the zero id, which callers use to mean "not requested".
	pub const fn is_unset(self) -> bool {
		self.0 == 0
	}

	/// Parses a chain id string as base-16.
	///
	/// An optional `0x`/`0X` prefix and surrounding whitespace are accepted.
	/// Strings without a prefix are still read as hex, so `"89"` is `137`.
	pub fn from_hex(input: &str) -> Result<ChainId, ChainIdError> {
		let trimmed = input.trim();
		let digits = trimmed
			.strip_prefix("0x")
			.or_else(|| trimmed.strip_prefix("0X"))
			.unwrap_or(trimmed);

		u64::from_str_radix(digits, 16)
			.map(ChainId)
			.map_err(|source| ChainIdError::InvalidHex {
				input: input.to_string(),
				source,
			})
	}
}

impl From<u64> for ChainId {
	fn from(value: u64) -> Self {
		ChainId(value)
	}
}

impl From<ChainId> for u64 {
	fn from(value: ChainId) -> Self {
		value.0
	}
}

impl fmt::Display for ChainId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Error produced when a chain id string is not valid base-16.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainIdError {
	#[error("invalid chain id {input:?}: expected a base-16 string")]
	InvalidHex {
		input: String,
		#[source]
		source: ParseIntError,
	},
}

/// Chain id exactly as a provider delivered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawChainId {
	Number(u64),
	Text(String),
}

impl RawChainId {
	/// Normalizes the raw value: numbers pass through, strings are parsed as hex.
	pub fn normalize(&self) -> Result<ChainId, ChainIdError> {
		match self {
			RawChainId::Number(n) => Ok(ChainId(*n)),
			RawChainId::Text(s) => ChainId::from_hex(s),
		}
	}
}

impl From<u64> for RawChainId {
	fn from(value: u64) -> Self {
		RawChainId::Number(value)
	}
}

impl From<&str> for RawChainId {
	fn from(value: &str) -> Self {
		RawChainId::Text(value.to_string())
	}
}

impl From<String> for RawChainId {
	fn from(value: String) -> Self {
		RawChainId::Text(value)
	}
}

impl fmt::Display for RawChainId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RawChainId::Number(n) => write!(f, "{n}"),
			RawChainId::Text(s) => f.write_str(s),
		}
	}
}

/// Networks the connector always advertises, independent of the requested one.
pub const SUPPORTED_NETWORKS: [ChainId; 4] = [ChainId::MAINNET, ChainId::POLYGON, ChainId::RINKEBY, ChainId::GOERLI];

/// Network a hosted session targets when no chain id was requested.
pub const DEFAULT_NETWORK: ChainId = ChainId::POLYGON;

/// Returns the well-known networks followed by `requested`, without duplicates.
pub fn supported_chain_ids(requested: ChainId) -> Vec<ChainId> {
	let mut ids = SUPPORTED_NETWORKS.to_vec();
	if !ids.contains(&requested) {
		ids.push(requested);
	}
	ids
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn numbers_pass_through() {
		assert_eq!(RawChainId::Number(137).normalize().unwrap(), ChainId(137));
		assert_eq!(RawChainId::Number(0).normalize().unwrap(), ChainId(0));
	}

	#[test]
	fn hex_strings_are_parsed_base16() {
		assert_eq!(RawChainId::from("0x89").normalize().unwrap(), ChainId(137));
		assert_eq!(RawChainId::from("0x1").normalize().unwrap(), ChainId::MAINNET);
		assert_eq!(RawChainId::from("0XA").normalize().unwrap(), ChainId(10));
		assert_eq!(RawChainId::from(" 0x5 ").normalize().unwrap(), ChainId::GOERLI);
	}

	#[test]
	fn unprefixed_strings_are_still_hex() {
		assert_eq!(RawChainId::from("89").normalize().unwrap(), ChainId(137));
		assert_eq!(RawChainId::from("10").normalize().unwrap(), ChainId(16));
	}

	#[test]
	fn invalid_strings_are_rejected() {
		for input in ["", "0x", "0xzz", "polygon"] {
			let err = RawChainId::from(input).normalize().unwrap_err();
			assert!(matches!(err, ChainIdError::InvalidHex { .. }), "{input}");
		}
	}

	#[test]
	fn raw_chain_id_deserializes_both_shapes() {
		let number: RawChainId = serde_json::from_str("137").unwrap();
		let text: RawChainId = serde_json::from_str("\"0x89\"").unwrap();
		assert_eq!(number, RawChainId::Number(137));
		assert_eq!(text, RawChainId::Text("0x89".into()));
		assert_eq!(number.normalize().unwrap(), text.normalize().unwrap());
	}

	#[test]
	fn supported_set_appends_requested_once() {
		assert_eq!(supported_chain_ids(ChainId(10)), vec![ChainId(1), ChainId(137), ChainId(4), ChainId(5), ChainId(10)]);
		assert_eq!(supported_chain_ids(ChainId::POLYGON), SUPPORTED_NETWORKS.to_vec());
	}
}
