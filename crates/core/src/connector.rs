//! Connector state machine.
//!
//! A [`SequenceConnector`] moves through `Idle -> Activating -> Active ->
//! Deactivating -> Idle`. Activation picks exactly one transport (see
//! [`resolve_activation_plan`]), bootstraps it, and subscribes to the four
//! provider events; deactivation disconnects the hosted session, removes those
//! listeners and emits [`ConnectorEvent::Deactivate`].
//!
//! Overlapping transitions are rejected: `activate` fails with
//! [`Error::AlreadyActive`] or [`Error::TransitionInProgress`], and a
//! `deactivate` racing another deactivation returns without disconnecting twice.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use sequence_protocol::{
	ChainId, ConnectOptions, ETH_ACCOUNTS, ETH_CHAIN_ID, ETH_REQUEST_ACCOUNTS, ProviderEvent, ProviderEventKind, RawChainId,
	RequestArguments, supported_chain_ids,
};
use sequence_runtime::{
	Error, EthereumProvider, ListenerFn, ProviderEnvironment, Result, SessionFactory, Subscription, WalletSession, listener,
};
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;
use tracing::debug;

use crate::events::{ConnectorEvent, ConnectorUpdate, EventHub, EventStream, EventSubscription, EventWaiter};
use crate::options::ConnectorOptions;
use crate::strategy::{ActivationInput, ActivationPath, ActivationPlan, resolve_activation_plan};

/// Observable lifecycle phase of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorPhase {
	Idle,
	Activating,
	Active,
	Deactivating,
}

/// Provider and account produced by a successful [`SequenceConnector::activate`].
#[derive(Clone)]
pub struct ConnectorActivation {
	pub provider: Arc<dyn EthereumProvider>,
	/// First exposed account; `None` if the wallet exposed none.
	pub account: Option<String>,
}

impl std::fmt::Debug for ConnectorActivation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConnectorActivation")
			.field("account", &self.account)
			.finish_non_exhaustive()
	}
}

struct ActiveConnection {
	provider: Arc<dyn EthereumProvider>,
	/// Hosted session owned by this connection. On the injected path this is only
	/// a session left over from an earlier failed hosted attempt.
	session: Option<Arc<dyn WalletSession>>,
	subscriptions: Vec<Subscription>,
	/// Distinguishes this connection from a later one while listeners are attached.
	epoch: u64,
}

enum Phase {
	/// `session` is a hosted session built by a failed attempt, kept so a retry reuses it.
	Idle { session: Option<Arc<dyn WalletSession>> },
	Activating,
	Active(ActiveConnection),
	Deactivating,
}

impl Phase {
	fn observable(&self) -> ConnectorPhase {
		match self {
			Phase::Idle { .. } => ConnectorPhase::Idle,
			Phase::Activating => ConnectorPhase::Activating,
			Phase::Active(_) => ConnectorPhase::Active,
			Phase::Deactivating => ConnectorPhase::Deactivating,
		}
	}

	fn provider(&self) -> Option<Arc<dyn EthereumProvider>> {
		match self {
			Phase::Active(connection) => Some(Arc::clone(&connection.provider)),
			_ => None,
		}
	}
}

/// What a deactivation tears down, and what to put back if the disconnect fails.
enum Teardown {
	Idle(Option<Arc<dyn WalletSession>>),
	Active(ActiveConnection),
}

impl Teardown {
	fn session(&self) -> Option<Arc<dyn WalletSession>> {
		match self {
			Teardown::Idle(session) => session.clone(),
			Teardown::Active(connection) => connection.session.clone(),
		}
	}

	fn restore(self) -> Phase {
		match self {
			Teardown::Idle(session) => Phase::Idle { session },
			Teardown::Active(connection) => Phase::Active(connection),
		}
	}
}

struct ConnectorState {
	chain_id: ChainId,
	phase: Phase,
	epoch: u64,
}

struct Bootstrapped {
	provider: Arc<dyn EthereumProvider>,
	chain_id: ChainId,
	account: Option<String>,
}

struct ConnectorInner {
	options: ConnectorOptions,
	supported_chain_ids: Vec<ChainId>,
	environment: Arc<dyn ProviderEnvironment>,
	factory: Arc<dyn SessionFactory>,
	state: Mutex<ConnectorState>,
	events: EventHub,
}

/// Wallet connector backed by an injected Sequence provider or a hosted session.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SequenceConnector {
	inner: Arc<ConnectorInner>,
}

impl SequenceConnector {
	/// Creates an idle connector.
	///
	/// `environment` is consulted for an injected provider on every activation;
	/// `factory` builds the hosted session when the injected path is unavailable.
	pub fn new(options: ConnectorOptions, environment: Arc<dyn ProviderEnvironment>, factory: Arc<dyn SessionFactory>) -> Self {
		let options = options.normalized();
		let supported_chain_ids = supported_chain_ids(options.chain_id);
		let chain_id = options.chain_id;

		Self {
			inner: Arc::new(ConnectorInner {
				options,
				supported_chain_ids,
				environment,
				factory,
				state: Mutex::new(ConnectorState {
					chain_id,
					phase: Phase::Idle { session: None },
					epoch: 0,
				}),
				events: EventHub::default(),
			}),
		}
	}

	pub fn options(&self) -> &ConnectorOptions {
		&self.inner.options
	}

	/// Well-known networks plus the requested chain.
	pub fn supported_chain_ids(&self) -> &[ChainId] {
		&self.inner.supported_chain_ids
	}

	/// Activates the connector and returns the provider and first account.
	///
	/// # Errors
	///
	/// - [`Error::ConnectionFailed`] if the hosted session does not connect
	/// - [`Error::AlreadyActive`] / [`Error::TransitionInProgress`] on overlapping calls
	/// - any provider or session error, unchanged
	pub async fn activate(&self) -> Result<ConnectorActivation> {
		self.inner.activate().await
	}

	/// Tears the connection down and emits [`ConnectorEvent::Deactivate`].
	///
	/// Safe on a connector that was never activated. If the hosted session fails
	/// to disconnect, the error is returned and the connection stays in place.
	pub async fn deactivate(&self) -> Result<()> {
		self.inner.deactivate().await
	}

	/// Alias for [`deactivate`](Self::deactivate).
	pub async fn close(&self) -> Result<()> {
		self.deactivate().await
	}

	/// Returns the active provider, if any.
	pub fn get_provider(&self) -> Option<Arc<dyn EthereumProvider>> {
		self.inner.state.lock().phase.provider()
	}

	/// Returns the current chain id (the requested one until activation).
	pub fn get_chain_id(&self) -> ChainId {
		self.inner.state.lock().chain_id
	}

	/// Asks the active provider for its accounts and returns the first.
	///
	/// This is a fresh request, not a cached read. Returns `None` when the
	/// connector is not active or the provider exposes no account.
	pub async fn get_account(&self) -> Result<Option<String>> {
		let Some(provider) = self.get_provider() else {
			return Ok(None);
		};
		let accounts: Vec<String> = request_as(provider.as_ref(), ETH_ACCOUNTS).await?;
		Ok(accounts.into_iter().next())
	}

	pub fn phase(&self) -> ConnectorPhase {
		self.inner.state.lock().phase.observable()
	}

	pub fn is_active(&self) -> bool {
		self.phase() == ConnectorPhase::Active
	}

	/// Subscribes to connector events emitted from now on.
	pub fn subscribe(&self) -> EventStream {
		self.inner.events.subscribe()
	}

	/// Returns a waiter for the next event matching `predicate`.
	///
	/// Register the waiter before triggering the transition it waits for.
	pub fn wait_for_event<F>(&self, predicate: F, timeout: Duration) -> EventWaiter
	where
		F: Fn(&ConnectorEvent) -> bool + Send + Sync + 'static,
	{
		self.inner.events.waiter(predicate, timeout)
	}

	/// Runs `handler` for every connector event on a background task.
	///
	/// Must be called within a tokio runtime. The task stops when the returned
	/// [`EventSubscription`] is dropped.
	pub fn on_event<F>(&self, handler: F) -> EventSubscription
	where
		F: Fn(ConnectorEvent) + Send + Sync + 'static,
	{
		let mut stream = self.inner.events.subscribe();
		let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

		tokio::spawn(async move {
			loop {
				tokio::select! {
					event = stream.recv() => match event {
						Some(event) => handler(event),
						None => break,
					},
					_ = &mut cancel_rx => break,
				}
			}
		});

		EventSubscription::new(cancel_tx)
	}
}

impl std::fmt::Debug for SequenceConnector {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.inner.state.lock();
		f.debug_struct("SequenceConnector")
			.field("app_name", &self.inner.options.app_name)
			.field("chain_id", &state.chain_id)
			.field("phase", &state.phase.observable())
			.finish()
	}
}

impl ConnectorInner {
	async fn activate(self: &Arc<Self>) -> Result<ConnectorActivation> {
		let (mut session, chain_id) = self.begin_activation()?;
		let injected = self.environment.injected_provider();

		let plan = resolve_activation_plan(ActivationInput {
			injected: injected.as_ref().map(|p| p.is_sequence()),
			has_session: session.is_some(),
			chain_id,
		});
		debug!(
			target = "sequence.connector",
			path = ?plan.path,
			construct_session = plan.construct_session,
			%chain_id,
			"activating"
		);

		let attempt = match (plan.path, injected) {
			(ActivationPath::Injected, Some(provider)) => self.bootstrap_injected(provider).await,
			_ => self.bootstrap_hosted(&mut session, plan).await,
		};

		match attempt {
			Ok(boot) => Ok(self.complete_activation(boot, session)),
			Err(err) => {
				debug!(target = "sequence.connector", error = %err, "activation failed");
				self.state.lock().phase = Phase::Idle { session };
				Err(err)
			}
		}
	}

	fn begin_activation(&self) -> Result<(Option<Arc<dyn WalletSession>>, ChainId)> {
		let mut state = self.state.lock();
		match std::mem::replace(&mut state.phase, Phase::Activating) {
			Phase::Idle { session } => Ok((session, state.chain_id)),
			other => {
				let err = match &other {
					Phase::Active(_) => Error::AlreadyActive,
					Phase::Deactivating => Error::TransitionInProgress("deactivation"),
					_ => Error::TransitionInProgress("activation"),
				};
				state.phase = other;
				Err(err)
			}
		}
	}

	async fn bootstrap_injected(&self, provider: Arc<dyn EthereumProvider>) -> Result<Bootstrapped> {
		provider.request(RequestArguments::new(ETH_REQUEST_ACCOUNTS)).await?;

		let (raw_chain_id, accounts) = tokio::try_join!(
			request_as::<RawChainId>(provider.as_ref(), ETH_CHAIN_ID),
			request_as::<Vec<String>>(provider.as_ref(), ETH_ACCOUNTS)
		)?;
		let chain_id = raw_chain_id.normalize()?;

		Ok(Bootstrapped {
			provider,
			chain_id,
			account: accounts.into_iter().next(),
		})
	}

	async fn bootstrap_hosted(&self, slot: &mut Option<Arc<dyn WalletSession>>, plan: ActivationPlan) -> Result<Bootstrapped> {
		let reusable = if plan.construct_session { None } else { slot.clone() };
		let session = match reusable {
			Some(session) => session,
			None => {
				let session = self.factory.init_wallet(plan.session_chain_id).await?;
				*slot = Some(Arc::clone(&session));
				session
			}
		};

		if !session.is_connected() {
			let details = session
				.connect(ConnectOptions {
					app: self.options.app_name.clone(),
					authorize: true,
				})
				.await?;
			if !details.connected {
				return Err(Error::ConnectionFailed("wallet session rejected the connection".to_string()));
			}
		}

		if !session.is_connected() {
			return Err(Error::ConnectionFailed("wallet session is not connected".to_string()));
		}

		let provider = session.provider();
		let address = session.address().await?;
		let chain_id = session.chain_id().await?.normalize()?;

		Ok(Bootstrapped {
			provider,
			chain_id,
			account: Some(address),
		})
	}

	fn complete_activation(self: &Arc<Self>, boot: Bootstrapped, session: Option<Arc<dyn WalletSession>>) -> ConnectorActivation {
		// Commit before subscribing: a provider may fire `close` as soon as a
		// listener is attached, and that deactivation must find this connection.
		let epoch = {
			let mut state = self.state.lock();
			state.epoch += 1;
			let epoch = state.epoch;
			state.chain_id = boot.chain_id;
			state.phase = Phase::Active(ActiveConnection {
				provider: Arc::clone(&boot.provider),
				session,
				subscriptions: Vec::new(),
				epoch,
			});
			epoch
		};

		let subscriptions = self.subscribe_provider(&boot.provider);
		let orphaned = {
			let mut state = self.state.lock();
			match &mut state.phase {
				Phase::Active(connection) if connection.epoch == epoch => {
					connection.subscriptions = subscriptions;
					None
				}
				_ => Some(subscriptions),
			}
		};
		if let Some(subscriptions) = orphaned {
			debug!(target = "sequence.connector", "connection torn down while subscribing, releasing listeners");
			drop(subscriptions);
		}

		debug!(
			target = "sequence.connector",
			chain_id = %boot.chain_id,
			account = boot.account.as_deref().unwrap_or("<none>"),
			"activated"
		);

		ConnectorActivation {
			provider: boot.provider,
			account: boot.account,
		}
	}

	fn subscribe_provider(self: &Arc<Self>, provider: &Arc<dyn EthereumProvider>) -> Vec<Subscription> {
		let weak = Arc::downgrade(self);
		ProviderEventKind::ALL
			.into_iter()
			.map(|kind| {
				let id = provider.on(kind, event_listener(weak.clone()));
				let handle = Arc::clone(provider);
				Subscription::new(
					id,
					kind,
					Arc::new(move |kind, id| {
						handle.remove_listener(kind, id);
					}),
				)
			})
			.collect()
	}

	async fn handle_provider_event(&self, event: ProviderEvent) -> Result<()> {
		match event {
			ProviderEvent::ChainChanged(raw) | ProviderEvent::NetworkChanged(raw) => {
				let chain_id = raw.normalize()?;
				let provider = {
					let mut state = self.state.lock();
					state.chain_id = chain_id;
					state.phase.provider()
				};
				self.events.emit(ConnectorEvent::Update(ConnectorUpdate {
					chain_id: Some(chain_id),
					account: None,
					provider,
				}));
				Ok(())
			}
			ProviderEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
				Some(account) => {
					self.events.emit(ConnectorEvent::Update(ConnectorUpdate {
						account: Some(account),
						..ConnectorUpdate::default()
					}));
					Ok(())
				}
				None => {
					debug!(target = "sequence.connector", "provider exposed no accounts, deactivating");
					self.deactivate().await
				}
			},
			ProviderEvent::Close => {
				debug!(target = "sequence.connector", "provider closed, deactivating");
				self.deactivate().await
			}
		}
	}

	async fn deactivate(&self) -> Result<()> {
		let teardown = {
			let mut state = self.state.lock();
			match std::mem::replace(&mut state.phase, Phase::Deactivating) {
				Phase::Idle { session } => Teardown::Idle(session),
				Phase::Active(connection) => Teardown::Active(connection),
				Phase::Deactivating => {
					debug!(target = "sequence.connector", "deactivation already in progress");
					return Ok(());
				}
				Phase::Activating => {
					state.phase = Phase::Activating;
					return Err(Error::TransitionInProgress("activation"));
				}
			}
		};

		if let Some(session) = teardown.session() {
			if let Err(err) = session.disconnect().await {
				debug!(target = "sequence.connector", error = %err, "session disconnect failed");
				self.state.lock().phase = teardown.restore();
				return Err(err);
			}
		}

		if let Teardown::Active(connection) = teardown {
			for subscription in connection.subscriptions {
				subscription.unsubscribe();
			}
		}

		self.state.lock().phase = Phase::Idle { session: None };
		debug!(target = "sequence.connector", "deactivated");
		self.events.emit(ConnectorEvent::Deactivate);
		Ok(())
	}
}

fn event_listener(weak: Weak<ConnectorInner>) -> ListenerFn {
	listener(move |event| {
		let weak = weak.clone();
		async move {
			match weak.upgrade() {
				Some(inner) => inner.handle_provider_event(event).await,
				None => Ok(()),
			}
		}
	})
}

async fn request_as<T: DeserializeOwned>(provider: &dyn EthereumProvider, method: &str) -> Result<T> {
	let value = provider.request(RequestArguments::new(method)).await?;
	Ok(serde_json::from_value(value)?)
}
