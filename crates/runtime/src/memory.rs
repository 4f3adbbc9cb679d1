//! In-memory collaborators for exercising a connector without a wallet.
//!
//! - [`MemoryProvider`]: scripted RPC responses plus a real listener registry
//! - [`MemorySession`]: hosted session with scripted connect/address/chain results
//! - [`MemorySessionFactory`]: hands out one [`MemorySession`] and counts calls
//!
//! # Example
//!
//! ```ignore
//! let provider = Arc::new(MemoryProvider::sequence());
//! provider.respond(ETH_CHAIN_ID, json!("0x1"));
//! provider.respond(ETH_ACCOUNTS, json!(["0xDEF"]));
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use sequence_protocol::{ChainId, ConnectDetails, ConnectOptions, ProviderEvent, ProviderEventKind, RawChainId, RequestArguments};
use serde_json::Value;
use tokio::sync::Notify;

use crate::error::{Error, Result, UNSUPPORTED_METHOD};
use crate::listeners::{ListenerFn, ListenerId, ListenerRegistry};
use crate::provider::{EthereumProvider, SessionFactory, WalletSession};

#[derive(Debug, Clone)]
enum Scripted {
	Value(Value),
	Error { code: Option<i64>, message: String },
}

/// Provider answering requests from a script.
///
/// Methods without a scripted response fail with
/// [`UNSUPPORTED_METHOD`](crate::error::UNSUPPORTED_METHOD).
#[derive(Default)]
pub struct MemoryProvider {
	is_sequence: bool,
	script: Mutex<HashMap<String, Scripted>>,
	requests: Mutex<Vec<RequestArguments>>,
	listeners: ListenerRegistry,
}

impl MemoryProvider {
	/// Provider that does not identify as a Sequence wallet.
	pub fn new() -> Self {
		Self::default()
	}

	/// Provider that identifies as a Sequence wallet.
	pub fn sequence() -> Self {
		Self {
			is_sequence: true,
			..Self::default()
		}
	}

	/// Answers every future `method` request with `value`.
	pub fn respond(&self, method: &str, value: Value) {
		self.script.lock().insert(method.to_string(), Scripted::Value(value));
	}

	/// Rejects every future `method` request.
	pub fn fail(&self, method: &str, code: Option<i64>, message: &str) {
		self.script.lock().insert(
			method.to_string(),
			Scripted::Error {
				code,
				message: message.to_string(),
			},
		);
	}

	/// Methods requested so far, in call order.
	pub fn requested_methods(&self) -> Vec<String> {
		self.requests.lock().iter().map(|r| r.method.clone()).collect()
	}

	/// Number of listeners registered for `kind`.
	pub fn listener_count(&self, kind: ProviderEventKind) -> usize {
		self.listeners.count(kind)
	}

	/// Number of listeners across all event kinds.
	pub fn total_listeners(&self) -> usize {
		self.listeners.len()
	}

	/// Delivers `event` to registered listeners and returns how many ran.
	pub async fn emit(&self, event: ProviderEvent) -> usize {
		self.listeners.dispatch(event).await
	}
}

#[async_trait]
impl EthereumProvider for MemoryProvider {
	async fn request(&self, args: RequestArguments) -> Result<Value> {
		let scripted = self.script.lock().get(&args.method).cloned();
		let method = args.method.clone();
		self.requests.lock().push(args);

		match scripted {
			Some(Scripted::Value(value)) => Ok(value),
			Some(Scripted::Error { code, message }) => Err(Error::request_failed(method, message, code)),
			None => Err(Error::request_failed(method, "method not supported", Some(UNSUPPORTED_METHOD))),
		}
	}

	fn on(&self, event: ProviderEventKind, listener: ListenerFn) -> ListenerId {
		self.listeners.insert(event, listener)
	}

	fn remove_listener(&self, event: ProviderEventKind, id: ListenerId) -> bool {
		self.listeners.remove(event, id)
	}

	fn is_sequence(&self) -> bool {
		self.is_sequence
	}
}

/// Hosted session driven by a script.
pub struct MemorySession {
	provider: Arc<MemoryProvider>,
	address: String,
	chain_id: RawChainId,
	connected: AtomicBool,
	accept_connect: bool,
	disconnect_error: Option<String>,
	connect_gate: Option<Arc<Notify>>,
	disconnect_gate: Option<Arc<Notify>>,
	connect_calls: AtomicUsize,
	disconnect_calls: AtomicUsize,
	last_connect: Mutex<Option<ConnectOptions>>,
}

impl MemorySession {
	/// Session that accepts `connect` and reports `address` on `chain_id`.
	pub fn new(provider: Arc<MemoryProvider>, address: impl Into<String>, chain_id: impl Into<RawChainId>) -> Self {
		Self {
			provider,
			address: address.into(),
			chain_id: chain_id.into(),
			connected: AtomicBool::new(false),
			accept_connect: true,
			disconnect_error: None,
			connect_gate: None,
			disconnect_gate: None,
			connect_calls: AtomicUsize::new(0),
			disconnect_calls: AtomicUsize::new(0),
			last_connect: Mutex::new(None),
		}
	}

	/// `connect` resolves with `{connected: false}`.
	pub fn reject_connect(mut self) -> Self {
		self.accept_connect = false;
		self
	}

	/// Session starts out connected, so `connect` is never needed.
	pub fn already_connected(self) -> Self {
		self.connected.store(true, Ordering::SeqCst);
		self
	}

	/// `disconnect` fails with `message`.
	pub fn fail_disconnect(mut self, message: impl Into<String>) -> Self {
		self.disconnect_error = Some(message.into());
		self
	}

	/// `connect` waits for `gate` to be notified before resolving.
	pub fn hold_connect(mut self, gate: Arc<Notify>) -> Self {
		self.connect_gate = Some(gate);
		self
	}

	/// `disconnect` waits for `gate` to be notified before resolving.
	pub fn hold_disconnect(mut self, gate: Arc<Notify>) -> Self {
		self.disconnect_gate = Some(gate);
		self
	}

	/// Provider handed out by [`WalletSession::provider`].
	pub fn memory_provider(&self) -> &Arc<MemoryProvider> {
		&self.provider
	}

	pub fn connect_calls(&self) -> usize {
		self.connect_calls.load(Ordering::SeqCst)
	}

	pub fn disconnect_calls(&self) -> usize {
		self.disconnect_calls.load(Ordering::SeqCst)
	}

	/// Options passed to the most recent `connect`.
	pub fn last_connect_options(&self) -> Option<ConnectOptions> {
		self.last_connect.lock().clone()
	}
}

#[async_trait]
impl WalletSession for MemorySession {
	async fn connect(&self, options: ConnectOptions) -> Result<ConnectDetails> {
		self.connect_calls.fetch_add(1, Ordering::SeqCst);
		*self.last_connect.lock() = Some(options);

		if let Some(gate) = &self.connect_gate {
			gate.notified().await;
		}

		if self.accept_connect {
			self.connected.store(true, Ordering::SeqCst);
			Ok(ConnectDetails::connected())
		} else {
			Ok(ConnectDetails::rejected())
		}
	}

	fn is_connected(&self) -> bool {
		self.connected.load(Ordering::SeqCst)
	}

	fn provider(&self) -> Arc<dyn EthereumProvider> {
		self.provider.clone()
	}

	async fn address(&self) -> Result<String> {
		Ok(self.address.clone())
	}

	async fn chain_id(&self) -> Result<RawChainId> {
		Ok(self.chain_id.clone())
	}

	async fn disconnect(&self) -> Result<()> {
		self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
		if let Some(gate) = &self.disconnect_gate {
			gate.notified().await;
		}
		if let Some(message) = &self.disconnect_error {
			return Err(Error::request_failed("disconnect", message.clone(), None));
		}
		self.connected.store(false, Ordering::SeqCst);
		Ok(())
	}
}

/// Factory returning the same [`MemorySession`] on every call.
pub struct MemorySessionFactory {
	session: Arc<MemorySession>,
	requested: Mutex<Vec<ChainId>>,
}

impl MemorySessionFactory {
	pub fn new(session: Arc<MemorySession>) -> Self {
		Self {
			session,
			requested: Mutex::new(Vec::new()),
		}
	}

	pub fn session(&self) -> &Arc<MemorySession> {
		&self.session
	}

	/// Number of sessions constructed so far.
	pub fn init_calls(&self) -> usize {
		self.requested.lock().len()
	}

	/// Chain ids passed to `init_wallet`, in call order.
	pub fn requested_chain_ids(&self) -> Vec<ChainId> {
		self.requested.lock().clone()
	}
}

#[async_trait]
impl SessionFactory for MemorySessionFactory {
	async fn init_wallet(&self, chain_id: ChainId) -> Result<Arc<dyn WalletSession>> {
		self.requested.lock().push(chain_id);
		Ok(self.session.clone())
	}
}

#[cfg(test)]
mod tests {
	use sequence_protocol::{ETH_ACCOUNTS, ETH_CHAIN_ID};
	use serde_json::json;

	use super::*;

	#[tokio::test]
	async fn provider_answers_from_script_and_logs_requests() {
		let provider = MemoryProvider::sequence();
		provider.respond(ETH_CHAIN_ID, json!("0x89"));

		let value = provider.request(RequestArguments::new(ETH_CHAIN_ID)).await.unwrap();
		assert_eq!(value, json!("0x89"));

		let err = provider.request(RequestArguments::new(ETH_ACCOUNTS)).await.unwrap_err();
		assert_eq!(err.code(), Some(UNSUPPORTED_METHOD));

		assert_eq!(provider.requested_methods(), vec![ETH_CHAIN_ID, ETH_ACCOUNTS]);
		assert!(provider.is_sequence());
		assert!(!MemoryProvider::new().is_sequence());
	}

	#[tokio::test]
	async fn scripted_failures_keep_code_and_message() {
		let provider = MemoryProvider::new();
		provider.fail("eth_requestAccounts", Some(4001), "User rejected the request");

		let err = provider.request(RequestArguments::new("eth_requestAccounts")).await.unwrap_err();
		assert!(err.is_user_rejection());
		assert!(err.to_string().contains("User rejected"));
	}

	#[tokio::test]
	async fn session_connect_flips_connected_flag() {
		let session = MemorySession::new(Arc::new(MemoryProvider::new()), "0xABC", "0x89");
		assert!(!session.is_connected());

		let details = session
			.connect(ConnectOptions {
				app: "demo".into(),
				authorize: true,
			})
			.await
			.unwrap();
		assert!(details.connected);
		assert!(session.is_connected());
		assert_eq!(session.last_connect_options().unwrap().app, "demo");

		session.disconnect().await.unwrap();
		assert!(!session.is_connected());
		assert_eq!(session.disconnect_calls(), 1);
	}

	#[tokio::test]
	async fn rejected_session_stays_disconnected() {
		let session = MemorySession::new(Arc::new(MemoryProvider::new()), "0xABC", 137u64).reject_connect();
		let details = session
			.connect(ConnectOptions {
				app: "app".into(),
				authorize: true,
			})
			.await
			.unwrap();
		assert!(!details.connected);
		assert!(!session.is_connected());
	}

	#[tokio::test]
	async fn held_disconnect_resolves_after_notify() {
		let gate = Arc::new(Notify::new());
		let session = Arc::new(MemorySession::new(Arc::new(MemoryProvider::new()), "0xABC", 137u64).hold_disconnect(gate.clone()));

		let pending = tokio::spawn({
			let session = session.clone();
			async move { session.disconnect().await }
		});
		while session.disconnect_calls() == 0 {
			tokio::task::yield_now().await;
		}
		assert!(!pending.is_finished());

		gate.notify_one();
		pending.await.unwrap().unwrap();
	}

	#[tokio::test]
	async fn factory_records_requested_chain() {
		let session = Arc::new(MemorySession::new(Arc::new(MemoryProvider::new()), "0xABC", 137u64));
		let factory = MemorySessionFactory::new(session);

		factory.init_wallet(ChainId::POLYGON).await.unwrap();
		assert_eq!(factory.init_calls(), 1);
		assert_eq!(factory.requested_chain_ids(), vec![ChainId::POLYGON]);
	}
}
