//! Capability traits for the collaborators a connector drives.
//!
//! - [`EthereumProvider`] - EIP-1193 provider (injected, or owned by a hosted session)
//! - [`WalletSession`] - hosted wallet session with its own connect/disconnect flow
//! - [`SessionFactory`] - constructs hosted sessions on demand
//! - [`ProviderEnvironment`] - where an injected provider is looked up at activation time

use std::sync::Arc;

use async_trait::async_trait;
use sequence_protocol::{ChainId, ConnectDetails, ConnectOptions, ProviderEventKind, RawChainId, RequestArguments};
use serde_json::Value;

use crate::error::Result;
use crate::listeners::{ListenerFn, ListenerId};

/// EIP-1193 style provider.
#[async_trait]
pub trait EthereumProvider: Send + Sync {
	/// Sends a JSON-RPC request and returns the raw result.
	async fn request(&self, args: RequestArguments) -> Result<Value>;

	/// Registers `listener` for `event` and returns an id for [`remove_listener`](Self::remove_listener).
	fn on(&self, event: ProviderEventKind, listener: ListenerFn) -> ListenerId;

	/// Unregisters a listener. Returns `false` if it was not registered.
	fn remove_listener(&self, event: ProviderEventKind, id: ListenerId) -> bool;

	/// Whether this provider identifies itself as a Sequence wallet.
	fn is_sequence(&self) -> bool {
		false
	}
}

/// Hosted wallet session.
#[async_trait]
pub trait WalletSession: Send + Sync {
	/// Opens the wallet and asks the user to connect `options.app`.
	async fn connect(&self, options: ConnectOptions) -> Result<ConnectDetails>;

	fn is_connected(&self) -> bool;

	/// Returns the provider backed by this session.
	fn provider(&self) -> Arc<dyn EthereumProvider>;

	/// Returns the connected wallet address.
	async fn address(&self) -> Result<String>;

	/// Returns the chain the session is currently on.
	async fn chain_id(&self) -> Result<RawChainId>;

	async fn disconnect(&self) -> Result<()>;
}

/// Constructs hosted wallet sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync {
	/// Initializes a session targeting `chain_id`.
	async fn init_wallet(&self, chain_id: ChainId) -> Result<Arc<dyn WalletSession>>;
}

/// Source of an injected provider.
pub trait ProviderEnvironment: Send + Sync {
	/// Returns the provider the host environment injected, if any.
	fn injected_provider(&self) -> Option<Arc<dyn EthereumProvider>>;
}

/// Environment with a fixed (possibly absent) injected provider.
#[derive(Clone, Default)]
pub struct StaticEnvironment {
	provider: Option<Arc<dyn EthereumProvider>>,
}

impl StaticEnvironment {
	/// Environment without an injected provider.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Environment exposing `provider`.
	pub fn with_provider(provider: Arc<dyn EthereumProvider>) -> Self {
		Self { provider: Some(provider) }
	}
}

impl ProviderEnvironment for StaticEnvironment {
	fn injected_provider(&self) -> Option<Arc<dyn EthereumProvider>> {
		self.provider.clone()
	}
}

impl std::fmt::Debug for StaticEnvironment {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StaticEnvironment")
			.field("injected", &self.provider.is_some())
			.finish()
	}
}
