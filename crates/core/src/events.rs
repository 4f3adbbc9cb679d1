//! Connector signal delivery.
//!
//! A connector reports back to the application only through [`ConnectorEvent`]s:
//!
//! pulled from an [`EventStream`], awaited once through an [`EventWaiter`], or
//! pushed to a callback held alive by an [`EventSubscription`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sequence_protocol::ChainId;
use sequence_runtime::{Error, EthereumProvider, Result};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, oneshot};

/// Connection-relevant state that changed. Any subset of fields may be set.
#[derive(Clone, Default)]
pub struct ConnectorUpdate {
	pub chain_id: Option<ChainId>,
	pub account: Option<String>,
	pub provider: Option<Arc<dyn EthereumProvider>>,
}

impl std::fmt::Debug for ConnectorUpdate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConnectorUpdate")
			.field("chain_id", &self.chain_id)
			.field("account", &self.account)
			.field("provider", &self.provider.is_some())
			.finish()
	}
}

/// Signal emitted by a connector.
#[derive(Debug, Clone)]
pub enum ConnectorEvent {
	/// Chain, account or provider changed.
	Update(ConnectorUpdate),
	/// The connection was torn down, explicitly or by the provider.
	Deactivate,
}

impl ConnectorEvent {
	pub fn is_deactivate(&self) -> bool {
		matches!(self, ConnectorEvent::Deactivate)
	}

	/// Returns the update payload, if this is an update.
	pub fn as_update(&self) -> Option<&ConnectorUpdate> {
		match self {
			ConnectorEvent::Update(update) => Some(update),
			ConnectorEvent::Deactivate => None,
		}
	}
}

/// RAII handle that cancels a callback-style observer when dropped.
pub struct EventSubscription {
	cancel_tx: Option<oneshot::Sender<()>>,
}

impl EventSubscription {
	pub(crate) fn new(cancel_tx: oneshot::Sender<()>) -> Self {
		Self { cancel_tx: Some(cancel_tx) }
	}

	/// Explicitly cancels the subscription, equivalent to dropping it.
	pub fn unsubscribe(mut self) {
		if let Some(tx) = self.cancel_tx.take() {
			let _ = tx.send(());
		}
	}
}

impl Drop for EventSubscription {
	fn drop(&mut self) {
		if let Some(tx) = self.cancel_tx.take() {
			let _ = tx.send(());
		}
	}
}

impl std::fmt::Debug for EventSubscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventSubscription")
			.field("active", &self.cancel_tx.is_some())
			.finish()
	}
}

struct Waiter {
	matches: Box<dyn Fn(&ConnectorEvent) -> bool + Send + Sync>,
	tx: Option<oneshot::Sender<ConnectorEvent>>,
}

/// Fan-out point for connector signals.
///
/// Pending waiters are served before stream subscribers, so a waiter never
/// misses its event to broadcast lag.
pub(crate) struct EventHub {
	tx: broadcast::Sender<ConnectorEvent>,
	waiters: Mutex<Vec<Waiter>>,
}

impl EventHub {
	const CAPACITY: usize = 256;

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			tx: broadcast::channel(capacity).0,
			waiters: Mutex::new(Vec::new()),
		}
	}

	pub fn emit(&self, event: ConnectorEvent) {
		self.waiters.lock().retain_mut(|waiter| {
			let Some(tx) = waiter.tx.take_if(|tx| !tx.is_closed()) else {
				// Abandoned waiter.
				return false;
			};
			if (waiter.matches)(&event) {
				let _ = tx.send(event.clone());
				false
			} else {
				waiter.tx = Some(tx);
				true
			}
		});
		let _ = self.tx.send(event);
	}

	pub fn subscribe(&self) -> EventStream {
		EventStream { rx: self.tx.subscribe() }
	}

	pub fn waiter(&self, matches: impl Fn(&ConnectorEvent) -> bool + Send + Sync + 'static, timeout: Duration) -> EventWaiter {
		let (tx, rx) = oneshot::channel();
		self.waiters.lock().push(Waiter {
			matches: Box::new(matches),
			tx: Some(tx),
		});
		EventWaiter { rx, timeout }
	}

	#[cfg(test)]
	fn pending_waiters(&self) -> usize {
		self.waiters.lock().len()
	}
}

impl Default for EventHub {
	fn default() -> Self {
		Self::with_capacity(Self::CAPACITY)
	}
}

/// Connector events emitted after [`SequenceConnector::subscribe`](crate::SequenceConnector::subscribe).
///
/// Lagging is logged and skipped; the stream only ends once the connector is gone.
pub struct EventStream {
	rx: broadcast::Receiver<ConnectorEvent>,
}

impl EventStream {
	pub async fn recv(&mut self) -> Option<ConnectorEvent> {
		loop {
			match self.rx.recv().await {
				Ok(event) => return Some(event),
				Err(RecvError::Lagged(skipped)) => log_lag(skipped),
				Err(RecvError::Closed) => return None,
			}
		}
	}

	/// Returns a queued event without waiting.
	pub fn try_recv(&mut self) -> Option<ConnectorEvent> {
		loop {
			match self.rx.try_recv() {
				Ok(event) => return Some(event),
				Err(TryRecvError::Lagged(skipped)) => log_lag(skipped),
				Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
			}
		}
	}

	/// Takes every queued event.
	pub fn drain(&mut self) -> Vec<ConnectorEvent> {
		std::iter::from_fn(|| self.try_recv()).collect()
	}
}

fn log_lag(skipped: u64) {
	tracing::warn!(target = "sequence.connector", skipped, "event stream lagged");
}

/// Pending capture of the next event matching a predicate.
pub struct EventWaiter {
	rx: oneshot::Receiver<ConnectorEvent>,
	timeout: Duration,
}

impl EventWaiter {
	/// # Errors
	///
	/// - [`Error::Timeout`] if nothing matched within the timeout
	/// - [`Error::ChannelClosed`] if the connector was dropped first
	pub async fn wait(self) -> Result<ConnectorEvent> {
		match tokio::time::timeout(self.timeout, self.rx).await {
			Ok(Ok(event)) => Ok(event),
			Ok(Err(_)) => Err(Error::ChannelClosed),
			Err(_) => Err(Error::Timeout(format!("no matching connector event within {:?}", self.timeout))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn update(chain: u64) -> ConnectorEvent {
		ConnectorEvent::Update(ConnectorUpdate {
			chain_id: Some(ChainId(chain)),
			..ConnectorUpdate::default()
		})
	}

	#[tokio::test]
	async fn every_stream_sees_every_event() {
		let hub = EventHub::with_capacity(16);
		let mut first = hub.subscribe();
		let mut second = hub.subscribe();

		hub.emit(update(137));

		for stream in [&mut first, &mut second] {
			let event = stream.recv().await.unwrap();
			assert_eq!(event.as_update().unwrap().chain_id, Some(ChainId::POLYGON));
		}
	}

	#[tokio::test]
	async fn waiter_skips_non_matching_events() {
		let hub = EventHub::with_capacity(16);
		let waiter = hub.waiter(ConnectorEvent::is_deactivate, Duration::from_secs(1));

		hub.emit(update(1));
		assert_eq!(hub.pending_waiters(), 1);

		hub.emit(ConnectorEvent::Deactivate);
		assert_eq!(hub.pending_waiters(), 0);
		assert!(waiter.wait().await.unwrap().is_deactivate());
	}

	#[test]
	fn dropped_waiters_are_pruned_on_emit() {
		let hub = EventHub::with_capacity(16);
		drop(hub.waiter(ConnectorEvent::is_deactivate, Duration::from_secs(1)));
		assert_eq!(hub.pending_waiters(), 1);

		hub.emit(update(1));
		assert_eq!(hub.pending_waiters(), 0);
	}

	#[test]
	fn drain_takes_queued_events_in_order() {
		let hub = EventHub::with_capacity(16);
		let mut stream = hub.subscribe();

		hub.emit(update(1));
		hub.emit(ConnectorEvent::Deactivate);

		let events = stream.drain();
		assert_eq!(events.len(), 2);
		assert!(events[1].is_deactivate());
		assert!(stream.try_recv().is_none());
	}

	#[tokio::test]
	async fn lagging_stream_resumes_at_oldest_retained_event() {
		let hub = EventHub::with_capacity(2);
		let mut stream = hub.subscribe();

		for chain in 1..=4 {
			hub.emit(update(chain));
		}

		let event = stream.recv().await.unwrap();
		assert_eq!(event.as_update().unwrap().chain_id, Some(ChainId(3)));
	}

	#[tokio::test]
	async fn waiter_times_out() {
		let hub = EventHub::with_capacity(16);
		let waiter = hub.waiter(ConnectorEvent::is_deactivate, Duration::from_millis(10));
		assert!(matches!(waiter.wait().await, Err(Error::Timeout(_))));
	}

	#[tokio::test]
	async fn waiter_reports_dropped_hub() {
		let hub = EventHub::with_capacity(16);
		let waiter = hub.waiter(ConnectorEvent::is_deactivate, Duration::from_secs(1));
		drop(hub);
		assert!(matches!(waiter.wait().await, Err(Error::ChannelClosed)));
	}

	#[test]
	fn update_debug_hides_provider_handle() {
		let rendered = format!("{:?}", update(5));
		assert!(rendered.contains("provider: false"));
	}
}
