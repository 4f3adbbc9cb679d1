//! Wire types shared between the Sequence connector and its collaborators.
//!
//! # Main Types
//!
//! - [`ChainId`] / [`RawChainId`] - normalized and on-the-wire chain identifiers
//! - [`RequestArguments`] - EIP-1193 `request` payload
//! - [`ProviderEvent`] / [`ProviderEventKind`] - events emitted by providers
//! - [`ConnectOptions`] / [`ConnectDetails`] - hosted session handshake

pub mod chain;
pub mod event;
pub mod rpc;
pub mod session;

pub use chain::{ChainId, ChainIdError, DEFAULT_NETWORK, RawChainId, SUPPORTED_NETWORKS, supported_chain_ids};
pub use event::{ProviderEvent, ProviderEventKind};
pub use rpc::{ETH_ACCOUNTS, ETH_CHAIN_ID, ETH_REQUEST_ACCOUNTS, RequestArguments};
pub use session::{ConnectDetails, ConnectOptions};
